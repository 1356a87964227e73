//! Reinforcement learning agents
pub mod async_dqn;
pub mod dqn;

pub use async_dqn::{AsyncDqnAgent, LearnerReport, PolicyAssignment, TrainOptions};
pub use dqn::DqnAgent;

pub use crate::torch::TrainGraphConfig;

use thiserror::Error;

/// Invalid agent or training configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("number of learner threads must be at least 1, got {0}")]
    InvalidNumThreads(usize),
    #[error("rollout batch size must be at least 1")]
    InvalidBatchSize,
    #[error("got {policies} exploration policies for {num_threads} learner threads")]
    PolicyCountMismatch { policies: usize, num_threads: usize },
    #[error("unknown optimizer {0:?}, expected one of \"sgd\", \"rmsprop\", \"adam\"")]
    UnknownOptimizer(String),
    #[error(
        "invalid epsilon schedule: start {eps_start}, final {eps_final} over {anneal_steps} steps"
    )]
    InvalidEpsilonSchedule {
        eps_start: f64,
        eps_final: f64,
        anneal_steps: u64,
    },
}
