pub mod metrics;
pub mod recent;
pub mod score;
