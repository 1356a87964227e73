//! Utility types and functions
pub mod discount;
pub mod stats;
pub mod tensor;

pub use discount::discounted_returns;
pub use stats::IncrementalStats;
