//! Deterministic environments for testing
use super::{Environment, SpaceSpec, StepOutcome};

/// Environment producing a fixed reward every step, terminating after a
/// fixed number of steps.
///
/// The observation is the fraction of the episode elapsed so far. Actions are
/// accepted but ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedRewardEnv {
    reward: f64,
    episode_len: u32,
    steps_taken: u32,
}

impl FixedRewardEnv {
    pub fn new(reward: f64, episode_len: u32) -> Self {
        assert!(episode_len > 0, "episodes must contain at least one step");
        Self {
            reward,
            episode_len,
            steps_taken: 0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn observation(&self) -> Vec<f32> {
        vec![self.steps_taken as f32 / self.episode_len as f32]
    }
}

impl Environment for FixedRewardEnv {
    fn observation_space(&self) -> SpaceSpec {
        SpaceSpec::Continuous { shape: vec![1] }
    }

    fn action_space(&self) -> SpaceSpec {
        SpaceSpec::Discrete { n: 2 }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.steps_taken = 0;
        self.observation()
    }

    fn step(&mut self, _action: usize) -> StepOutcome {
        assert!(self.steps_taken < self.episode_len, "stepped past terminal");
        self.steps_taken += 1;
        StepOutcome {
            observation: self.observation(),
            reward: self.reward,
            terminal: self.steps_taken == self.episode_len,
        }
    }

    fn boxed_copy(&self) -> Box<dyn Environment> {
        Box::new(Self::new(self.reward, self.episode_len))
    }
}
