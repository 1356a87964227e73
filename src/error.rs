//! Error type
use crate::agents::ConfigError;
use crate::envs::UnsupportedSpaceError;
use crate::torch::CheckpointError;
use tch::TchError;
use thiserror::Error;

/// Error from the RL crate.
#[derive(Error, Debug)]
pub enum RLError {
    #[error("unsupported environment space")]
    UnsupportedSpace(#[from] UnsupportedSpaceError),
    #[error("invalid training configuration")]
    Config(#[from] ConfigError),
    #[error("checkpoint error")]
    Checkpoint(#[from] CheckpointError),
    #[error("torch error")]
    Tch(#[from] TchError),
}
