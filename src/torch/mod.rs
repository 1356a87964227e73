//! Networks, optimizers and the shared parameter layer
pub mod checkpoint;
pub mod decay;
pub mod network;
pub mod optimizers;
pub mod params;

pub use checkpoint::{
    latest_checkpoint, load_checkpoint, save_checkpoint, CheckpointError, CheckpointMeta,
};
pub use decay::DecaySchedule;
pub use network::{Mlp, MlpConfig, QModel};
pub use optimizers::{AdamConfig, OptimizerDef, RmsPropConfig, SgdConfig};
pub use params::{GradientError, ParamServer, TrainGraphConfig};
