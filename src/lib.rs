//! A reinforcement learning experimentation framework built around
//! asynchronous n-step Q-learning.
//!
//! A single [`AsyncDqnAgent`] owns the canonical network parameters, optimizer
//! and target network while several learner threads collect rollouts from
//! private environment copies and apply their gradients to the shared
//! parameter set, following
//! "Asynchronous Methods for Deep Reinforcement Learning" (Mnih et al., 2016).
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)]
pub mod agents;
pub mod envs;
mod error;
pub mod logging;
pub mod policies;
pub mod torch;
pub mod utils;

pub use agents::{AsyncDqnAgent, DqnAgent, TrainGraphConfig, TrainOptions};
pub use envs::Environment;
pub use error::RLError;
pub use logging::Logger;
pub use policies::{EpsilonGreedy, Greedy, Policy};

/// Pseudo-random number generator used throughout the crate.
pub type Prng = rand_chacha::ChaCha8Rng;
