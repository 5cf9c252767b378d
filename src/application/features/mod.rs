pub mod engine;
pub mod rolling;

pub use engine::{FeatureConfig, FeatureEngine, compute_features};
