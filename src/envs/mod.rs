//! Reinforcement learning environments
mod cartpole;
pub mod testing;

pub use cartpole::CartPole;

use thiserror::Error;

/// Shape and typing of an observation or action space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceSpec {
    /// A finite set of `n` choices.
    Discrete { n: usize },
    /// A real-valued box with the given shape.
    Continuous { shape: Vec<usize> },
}

impl SpaceSpec {
    /// Flattened feature count of elements of this space.
    pub fn num_features(&self) -> usize {
        match self {
            Self::Discrete { n } => *n,
            Self::Continuous { shape } => shape.iter().product(),
        }
    }
}

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Observation of the successor state.
    pub observation: Vec<f32>,
    /// Reward for this transition.
    pub reward: f64,
    /// Whether the successor state ends the episode.
    pub terminal: bool,
}

/// A stateful reinforcement learning environment.
///
/// Observations are flattened feature vectors and actions are indices into a
/// discrete action set; environments with other element types are expected to
/// encode/decode at this boundary.
pub trait Environment: Send {
    fn observation_space(&self) -> SpaceSpec;

    fn action_space(&self) -> SpaceSpec;

    /// Reset to an initial state, starting a new episode.
    fn reset(&mut self) -> Vec<f32>;

    /// Take one step. Must not be called after a terminal outcome without an
    /// intervening `reset`.
    fn step(&mut self, action: usize) -> StepOutcome;

    /// Display the current state, if the environment supports it.
    fn render(&self) {}

    /// An independent environment instance with identical configuration.
    fn boxed_copy(&self) -> Box<dyn Environment>;
}

/// Error for an environment whose spaces an agent cannot handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {what} space {space:?}; this agent requires a discrete action space")]
pub struct UnsupportedSpaceError {
    pub what: &'static str,
    pub space: SpaceSpec,
}

/// Validated structure of a discrete-action environment.
///
/// Space compatibility is resolved once, here, at construction time; agents
/// store the result instead of re-checking on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteActionSpec {
    /// Flattened observation feature count.
    pub num_observation_features: usize,
    /// Number of discrete actions.
    pub num_actions: usize,
}

impl DiscreteActionSpec {
    pub fn from_env(env: &dyn Environment) -> Result<Self, UnsupportedSpaceError> {
        let num_actions = match env.action_space() {
            SpaceSpec::Discrete { n } => n,
            space @ SpaceSpec::Continuous { .. } => {
                return Err(UnsupportedSpaceError {
                    what: "action",
                    space,
                })
            }
        };
        Ok(Self {
            num_observation_features: env.observation_space().num_features(),
            num_actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixedRewardEnv;
    use super::*;

    #[test]
    fn discrete_spec_from_env() {
        let env = FixedRewardEnv::new(1.0, 5);
        let spec = DiscreteActionSpec::from_env(&env).unwrap();
        assert_eq!(spec.num_actions, 2);
        assert_eq!(spec.num_observation_features, 1);
    }

    #[test]
    fn continuous_action_space_rejected() {
        struct ContinuousActions(FixedRewardEnv);
        impl Environment for ContinuousActions {
            fn observation_space(&self) -> SpaceSpec {
                self.0.observation_space()
            }
            fn action_space(&self) -> SpaceSpec {
                SpaceSpec::Continuous { shape: vec![2] }
            }
            fn reset(&mut self) -> Vec<f32> {
                self.0.reset()
            }
            fn step(&mut self, action: usize) -> StepOutcome {
                self.0.step(action)
            }
            fn boxed_copy(&self) -> Box<dyn Environment> {
                Box::new(Self(self.0.clone()))
            }
        }

        let env = ContinuousActions(FixedRewardEnv::new(1.0, 5));
        let err = DiscreteActionSpec::from_env(&env).unwrap_err();
        assert_eq!(err.what, "action");
    }
}
