pub mod features;
pub mod market_data;
pub mod pipeline;
