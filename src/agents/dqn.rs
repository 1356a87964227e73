//! Single-environment deep Q-learning agent
use crate::envs::{DiscreteActionSpec, Environment, StepOutcome, UnsupportedSpaceError};
use crate::policies::{Greedy, Policy};
use crate::torch::checkpoint::{self, CheckpointError, CheckpointMeta};
use crate::torch::params::ParamServer;
use crate::torch::{MlpConfig, QModel};
use crate::utils::IncrementalStats;
use crate::Prng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tch::{Device, TchError};

/// A Q-learning agent over one environment instance.
///
/// Owns an environment, an action-value network and a private random number
/// generator. Serves both as a standalone evaluation agent and as the local
/// replica inside each asynchronous learner thread.
pub struct DqnAgent {
    env: Box<dyn Environment>,
    spec: DiscreteActionSpec,
    model: QModel,
    rng: Prng,
}

impl DqnAgent {
    pub fn new(
        env: Box<dyn Environment>,
        net_config: &MlpConfig,
        device: Device,
        seed: u64,
    ) -> Result<Self, UnsupportedSpaceError> {
        let spec = DiscreteActionSpec::from_env(env.as_ref())?;
        Ok(Self {
            env,
            spec,
            model: QModel::new(net_config, spec, device),
            rng: Prng::seed_from_u64(seed),
        })
    }

    pub const fn spec(&self) -> DiscreteActionSpec {
        self.spec
    }

    pub const fn model(&self) -> &QModel {
        &self.model
    }

    pub fn env_copy(&self) -> Box<dyn Environment> {
        self.env.boxed_copy()
    }

    /// Action values of the current network for one observation.
    pub fn predict(&self, observation: &[f32]) -> Vec<f32> {
        self.model.values(observation)
    }

    pub fn reset_env(&mut self) -> Vec<f32> {
        self.env.reset()
    }

    pub fn step_env(&mut self, action: usize) -> StepOutcome {
        self.env.step(action)
    }

    /// Replace the local parameters with the server's current snapshot.
    pub fn sync_from(&mut self, server: &ParamServer) -> Result<(), TchError> {
        server.read_snapshot(self.model.var_store_mut())
    }

    /// Run greedy evaluation episodes and return statistics over the
    /// undiscounted, unclipped episode rewards.
    pub fn evaluate(
        &mut self,
        episodes: usize,
        max_episode_steps: u64,
        render: bool,
    ) -> IncrementalStats {
        let mut policy = Greedy;
        let mut stats = IncrementalStats::new();
        for _ in 0..episodes {
            let mut observation = self.env.reset();
            let mut episode_reward = 0.0;
            for _ in 0..max_episode_steps {
                if render {
                    self.env.render();
                }
                let values = self.model.values(&observation);
                let action = policy.select_action(&values, 0, &mut self.rng);
                let outcome = self.env.step(action);
                episode_reward += outcome.reward;
                observation = outcome.observation;
                if outcome.terminal {
                    break;
                }
            }
            stats.add(episode_reward);
        }
        stats
    }

    /// Save the network parameters as a checkpoint in `dir`.
    pub fn save(&self, dir: &Path, keep: usize) -> Result<PathBuf, CheckpointError> {
        checkpoint::save_checkpoint(dir, self.model.var_store(), &CheckpointMeta::default(), keep)
    }

    /// Load the newest checkpoint from `dir` into the network.
    pub fn load(&mut self, dir: &Path) -> Result<CheckpointMeta, CheckpointError> {
        checkpoint::load_checkpoint(dir, self.model.var_store_mut())
    }
}
