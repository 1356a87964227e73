//! Saving and restoring training state
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tch::{nn::VarStore, TchError};
use thiserror::Error;

/// Training counters stored alongside the model parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Global number of environment observations taken.
    pub observation_steps: u64,
    /// Number of optimizer updates applied.
    pub optimizer_steps: u64,
}

/// Error saving or loading a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("no checkpoint found in {path:?}")]
    Missing { path: PathBuf },
    #[error("checkpoint file error")]
    Io(#[from] std::io::Error),
    #[error("checkpoint metadata error")]
    Metadata(#[from] serde_json::Error),
    #[error("error saving or loading model parameters")]
    Tch(#[from] TchError),
}

fn model_path(dir: &Path, step: u64) -> PathBuf {
    dir.join(format!("model-{}.ot", step))
}

fn state_path(dir: &Path, step: u64) -> PathBuf {
    dir.join(format!("state-{}.json", step))
}

/// Save a checkpoint into `dir`, named after the observation step count.
///
/// Keeps the `keep` newest checkpoints in `dir` and deletes the rest.
/// Returns the path of the saved model file.
pub fn save_checkpoint(
    dir: &Path,
    vs: &VarStore,
    meta: &CheckpointMeta,
    keep: usize,
) -> Result<PathBuf, CheckpointError> {
    fs::create_dir_all(dir)?;
    let model = model_path(dir, meta.observation_steps);
    vs.save(&model)?;
    serde_json::to_writer(
        File::create(state_path(dir, meta.observation_steps))?,
        meta,
    )?;
    rotate(dir, keep)?;
    Ok(model)
}

/// The observation step count of the newest checkpoint in `dir`, if any.
pub fn latest_checkpoint(dir: &Path) -> Result<Option<u64>, CheckpointError> {
    Ok(checkpoint_steps(dir)?.into_iter().max())
}

/// Load the newest checkpoint in `dir` into `vs` and return its counters.
pub fn load_checkpoint(dir: &Path, vs: &mut VarStore) -> Result<CheckpointMeta, CheckpointError> {
    let step = latest_checkpoint(dir)?.ok_or_else(|| CheckpointError::Missing {
        path: dir.to_path_buf(),
    })?;
    vs.load(model_path(dir, step))?;
    let meta = serde_json::from_reader(File::open(state_path(dir, step))?)?;
    Ok(meta)
}

fn checkpoint_steps(dir: &Path) -> Result<Vec<u64>, CheckpointError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut steps = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let step = name
            .to_str()
            .and_then(|name| name.strip_prefix("model-"))
            .and_then(|rest| rest.strip_suffix(".ot"))
            .and_then(|step| step.parse().ok());
        if let Some(step) = step {
            steps.push(step);
        }
    }
    Ok(steps)
}

fn rotate(dir: &Path, keep: usize) -> Result<(), CheckpointError> {
    let mut steps = checkpoint_steps(dir)?;
    steps.sort_unstable_by(|a, b| b.cmp(a));
    for &step in steps.iter().skip(keep.max(1)) {
        fs::remove_file(model_path(dir, step))?;
        let state = state_path(dir, step);
        if state.exists() {
            fs::remove_file(state)?;
        }
    }
    Ok(())
}
