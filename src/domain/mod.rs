// Canonical kline records and tables
pub mod candle;

// Derived feature records
pub mod features;

// Undefined-aware numeric cells
pub mod value;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
