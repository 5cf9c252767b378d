//! Columnar (Parquet) persistence for candle and feature tables.

pub mod loader;
pub mod writer;

pub use loader::load_many;
pub use writer::{write_candles, write_features};
