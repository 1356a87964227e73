//! Shared parameter server
use super::checkpoint::{self, CheckpointError, CheckpointMeta};
use super::decay::DecaySchedule;
use super::network::{MlpConfig, QModel};
use super::optimizers::OptimizerDef;
use crate::envs::DiscreteActionSpec;
use crate::utils::tensor::clip_by_global_norm;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tch::{nn::VarStore, COptimizer, Device, TchError, Tensor};
use thiserror::Error;

/// Configuration of the shared training graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainGraphConfig {
    pub optimizer: OptimizerDef,
    pub learning_rate: f64,
    pub decay: DecaySchedule,
    /// Maximum global gradient norm; gradients are rescaled above it.
    pub gradient_clip: Option<f64>,
    /// Number of checkpoints to keep when saving.
    pub saver_keep: usize,
}

impl Default for TrainGraphConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerDef::default(),
            learning_rate: 1e-4,
            decay: DecaySchedule::Constant,
            gradient_clip: Some(40.0),
            saver_keep: 10,
        }
    }
}

/// Error applying a gradient update.
#[derive(Debug, Error)]
pub enum GradientError {
    #[error("got {actual} gradients for {expected} trainable parameters")]
    Mismatch { expected: usize, actual: usize },
    #[error("optimizer error")]
    Tch(#[from] TchError),
}

/// Global training state shared by all learner threads.
///
/// Holds the online and target networks, the optimizer and the global
/// counters. Learners pull parameter snapshots with [`read_snapshot`] and
/// push locally computed gradients with [`apply_gradients`]; gradients are
/// matched to parameters positionally, which is sound because every replica
/// is built from the same network configuration.
///
/// [`read_snapshot`]: Self::read_snapshot
/// [`apply_gradients`]: Self::apply_gradients
pub struct ParamServer {
    shared: Mutex<SharedModel>,
    observation_counter: AtomicU64,
    optimizer_counter: AtomicU64,
    stop: AtomicBool,
}

struct SharedModel {
    online: QModel,
    target: QModel,
    optimizer: COptimizer,
    base_learning_rate: f64,
    decay: DecaySchedule,
    gradient_clip: Option<f64>,
    saver_keep: usize,
}

impl ParamServer {
    pub fn new(
        net_config: &MlpConfig,
        spec: DiscreteActionSpec,
        device: Device,
        graph: &TrainGraphConfig,
    ) -> Result<Self, TchError> {
        let online = QModel::new(net_config, spec, device);
        let mut target = QModel::new(net_config, spec, device);
        target.var_store_mut().copy(online.var_store())?;

        let mut optimizer = graph
            .optimizer
            .build_optimizer(online.var_store(), graph.learning_rate)?;
        // The optimizer steps from the parameters' gradient tensors, so every
        // gradient must exist before the first positional copy into it.
        online.prime_gradients();
        optimizer.zero_grad()?;

        Ok(Self {
            shared: Mutex::new(SharedModel {
                online,
                target,
                optimizer,
                base_learning_rate: graph.learning_rate,
                decay: graph.decay,
                gradient_clip: graph.gradient_clip,
                saver_keep: graph.saver_keep,
            }),
            observation_counter: AtomicU64::new(0),
            optimizer_counter: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        })
    }

    /// Copy the current online parameters into a local variable store.
    pub fn read_snapshot(&self, local: &mut VarStore) -> Result<(), TchError> {
        let shared = self.shared.lock().unwrap();
        local.copy(shared.online.var_store())
    }

    /// Apply one batch of gradients to the online parameters.
    ///
    /// `gradients` must contain one tensor per trainable parameter, in
    /// registration order. They are clipped by global norm (in place), copied
    /// into the online parameters' gradients and stepped with the decayed
    /// learning rate.
    pub fn apply_gradients(&self, gradients: &[Tensor]) -> Result<(), GradientError> {
        let mut shared = self.shared.lock().unwrap();
        let variables = shared.online.trainable_variables();
        if variables.len() != gradients.len() {
            return Err(GradientError::Mismatch {
                expected: variables.len(),
                actual: gradients.len(),
            });
        }
        if let Some(max_norm) = shared.gradient_clip {
            clip_by_global_norm(gradients, max_norm);
        }
        let rate = shared
            .decay
            .learning_rate(shared.base_learning_rate, self.optimizer_steps());
        shared.optimizer.set_learning_rate(rate)?;
        tch::no_grad(|| {
            for (variable, gradient) in variables.iter().zip(gradients) {
                let mut dst = variable.grad();
                dst.copy_(gradient);
            }
        });
        shared.optimizer.step()?;
        self.optimizer_counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Copy the online parameters into the target network.
    pub fn target_update(&self) -> Result<(), TchError> {
        let mut shared = self.shared.lock().unwrap();
        let SharedModel { online, target, .. } = &mut *shared;
        target.var_store_mut().copy(online.var_store())
    }

    /// Action values of the target network for one observation.
    pub fn target_values(&self, observation: &[f32]) -> Vec<f32> {
        self.shared.lock().unwrap().target.values(observation)
    }

    /// Action values of the online network for one observation.
    pub fn online_values(&self, observation: &[f32]) -> Vec<f32> {
        self.shared.lock().unwrap().online.values(observation)
    }

    /// Global number of environment observations taken so far.
    pub fn observation_steps(&self) -> u64 {
        self.observation_counter.load(Ordering::Relaxed)
    }

    /// Count one environment observation and return the new total.
    pub fn next_observation_step(&self) -> u64 {
        self.observation_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of optimizer updates applied so far.
    pub fn optimizer_steps(&self) -> u64 {
        self.optimizer_counter.load(Ordering::Relaxed)
    }

    /// Ask all learners to finish their current batch and exit.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Checkpoint the online parameters and counters into `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, CheckpointError> {
        let meta = CheckpointMeta {
            observation_steps: self.observation_steps(),
            optimizer_steps: self.optimizer_steps(),
        };
        let shared = self.shared.lock().unwrap();
        checkpoint::save_checkpoint(dir, shared.online.var_store(), &meta, shared.saver_keep)
    }

    /// Restore the newest checkpoint in `dir`.
    ///
    /// Loads the online parameters, re-synchronizes the target network and
    /// restores the global counters. Optimizer accumulator state is not
    /// persisted and restarts empty.
    pub fn restore_latest(&self, dir: &Path) -> Result<CheckpointMeta, CheckpointError> {
        let mut shared = self.shared.lock().unwrap();
        let meta = checkpoint::load_checkpoint(dir, shared.online.var_store_mut())?;
        let SharedModel { online, target, .. } = &mut *shared;
        target.var_store_mut().copy(online.var_store())?;
        self.observation_counter
            .store(meta.observation_steps, Ordering::Relaxed);
        self.optimizer_counter
            .store(meta.optimizer_steps, Ordering::Relaxed);
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn spec() -> DiscreteActionSpec {
        DiscreteActionSpec {
            num_observation_features: 2,
            num_actions: 2,
        }
    }

    fn server(graph: &TrainGraphConfig) -> ParamServer {
        ParamServer::new(&MlpConfig::default(), spec(), Device::Cpu, graph).unwrap()
    }

    fn local_gradients(server: &ParamServer) -> (Vec<f32>, Vec<Tensor>) {
        let mut local = QModel::new(&MlpConfig::default(), spec(), Device::Cpu);
        server.read_snapshot(local.var_store_mut()).unwrap();
        let observation = vec![0.5, -0.5];
        let values = local.values(&observation);
        let (_, gradients) = local.loss_gradients(&[observation], &[0], &[values[0] + 1.0]);
        (values, gradients)
    }

    #[test]
    fn read_snapshot_matches_online_values() {
        let server = server(&TrainGraphConfig::default());
        let mut local = QModel::new(&MlpConfig::default(), spec(), Device::Cpu);
        server.read_snapshot(local.var_store_mut()).unwrap();
        let observation = [1.0, 2.0];
        assert_eq!(local.values(&observation), server.online_values(&observation));
    }

    #[test]
    fn apply_gradients_moves_online_but_not_target() {
        let graph = TrainGraphConfig {
            optimizer: OptimizerDef::Sgd(crate::torch::optimizers::SgdConfig::default()),
            learning_rate: 0.1,
            ..TrainGraphConfig::default()
        };
        let server = server(&graph);
        let observation = [0.5, -0.5];
        let target_before = server.target_values(&observation);

        let (online_before, gradients) = local_gradients(&server);
        server.apply_gradients(&gradients).unwrap();

        assert_ne!(server.online_values(&observation), online_before);
        assert_eq!(server.target_values(&observation), target_before);
        assert_eq!(server.optimizer_steps(), 1);
    }

    #[test]
    fn target_update_synchronizes_networks() {
        let server = server(&TrainGraphConfig::default());
        let (_, gradients) = local_gradients(&server);
        server.apply_gradients(&gradients).unwrap();
        server.target_update().unwrap();
        let observation = [0.5, -0.5];
        assert_eq!(
            server.target_values(&observation),
            server.online_values(&observation)
        );
    }

    #[test]
    fn gradient_count_mismatch_is_rejected() {
        let server = server(&TrainGraphConfig::default());
        let (_, mut gradients) = local_gradients(&server);
        gradients.pop();
        assert!(matches!(
            server.apply_gradients(&gradients),
            Err(GradientError::Mismatch { .. })
        ));
    }

    #[test]
    fn observation_counter_is_monotonic() {
        let server = server(&TrainGraphConfig::default());
        assert_eq!(server.next_observation_step(), 1);
        assert_eq!(server.next_observation_step(), 2);
        assert_eq!(server.observation_steps(), 2);
    }

    #[test]
    fn save_and_restore_round_trip() {
        let dir = std::env::temp_dir().join(format!("param-server-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let server = server(&TrainGraphConfig::default());
        for _ in 0..5 {
            server.next_observation_step();
        }
        let observation = [0.25, 0.75];
        let values = server.online_values(&observation);
        server.save(&dir).unwrap();

        let restored = self::server(&TrainGraphConfig::default());
        let meta = restored.restore_latest(&dir).unwrap();
        assert_eq!(meta.observation_steps, 5);
        assert_eq!(restored.observation_steps(), 5);
        assert_eq!(restored.online_values(&observation), values);
        assert_eq!(restored.target_values(&observation), values);

        let _ = fs::remove_dir_all(&dir);
    }
}
