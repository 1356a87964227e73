//! Optimizer configuration
use crate::agents::ConfigError;
use tch::{nn::VarStore, COptimizer, TchError};

/// Stochastic gradient descent configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgdConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub dampening: f64,
    pub weight_decay: f64,
    pub nesterov: bool,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-2,
            momentum: 0.0,
            dampening: 0.0,
            weight_decay: 0.0,
            nesterov: false,
        }
    }
}

impl TryFrom<&SgdConfig> for COptimizer {
    type Error = TchError;

    fn try_from(config: &SgdConfig) -> Result<Self, Self::Error> {
        Self::sgd(
            config.learning_rate,
            config.momentum,
            config.dampening,
            config.weight_decay,
            config.nesterov,
        )
    }
}

/// RMSProp configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmsPropConfig {
    pub learning_rate: f64,
    pub alpha: f64,
    pub epsilon: f64,
    pub weight_decay: f64,
    pub momentum: f64,
    pub centered: bool,
}

impl Default for RmsPropConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            alpha: 0.99,
            epsilon: 1e-8,
            weight_decay: 0.0,
            momentum: 0.0,
            centered: false,
        }
    }
}

impl TryFrom<&RmsPropConfig> for COptimizer {
    type Error = TchError;

    fn try_from(config: &RmsPropConfig) -> Result<Self, Self::Error> {
        Self::rms_prop(
            config.learning_rate,
            config.alpha,
            config.epsilon,
            config.weight_decay,
            config.momentum,
            config.centered,
        )
    }
}

/// Adam configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub weight_decay: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            beta1: 0.9,
            beta2: 0.999,
            weight_decay: 0.0,
        }
    }
}

impl TryFrom<&AdamConfig> for COptimizer {
    type Error = TchError;

    fn try_from(config: &AdamConfig) -> Result<Self, Self::Error> {
        Self::adam(
            config.learning_rate,
            config.beta1,
            config.beta2,
            config.weight_decay,
        )
    }
}

/// Optimizer choice with hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerDef {
    Sgd(SgdConfig),
    RmsProp(RmsPropConfig),
    Adam(AdamConfig),
}

impl Default for OptimizerDef {
    fn default() -> Self {
        Self::Adam(AdamConfig::default())
    }
}

impl OptimizerDef {
    /// Construct from a case-insensitive optimizer name with default
    /// hyperparameters.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "sgd" => Ok(Self::Sgd(SgdConfig::default())),
            "rmsprop" => Ok(Self::RmsProp(RmsPropConfig::default())),
            "adam" => Ok(Self::Adam(AdamConfig::default())),
            _ => Err(ConfigError::UnknownOptimizer(name.into())),
        }
    }

    /// Build a [`COptimizer`] over the trainable variables of `vs`.
    ///
    /// `learning_rate` overrides the rate stored in the configuration.
    pub fn build_optimizer(
        &self,
        vs: &VarStore,
        learning_rate: f64,
    ) -> Result<COptimizer, TchError> {
        let mut optimizer = match self {
            Self::Sgd(config) => COptimizer::try_from(&SgdConfig {
                learning_rate,
                ..*config
            })?,
            Self::RmsProp(config) => COptimizer::try_from(&RmsPropConfig {
                learning_rate,
                ..*config
            })?,
            Self::Adam(config) => COptimizer::try_from(&AdamConfig {
                learning_rate,
                ..*config
            })?,
        };
        for variable in vs.trainable_variables() {
            optimizer.add_parameters(&variable, 0)?;
        }
        Ok(optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sgd")]
    #[case("RMSProp")]
    #[case("Adam")]
    fn from_name_accepts_known_optimizers(#[case] name: &str) {
        OptimizerDef::from_name(name).unwrap();
    }

    #[test]
    fn from_name_rejects_unknown_optimizer() {
        assert!(matches!(
            OptimizerDef::from_name("adagrad"),
            Err(ConfigError::UnknownOptimizer(_))
        ));
    }

    #[test]
    fn build_registers_trainable_variables() {
        use crate::envs::DiscreteActionSpec;
        use crate::torch::network::{MlpConfig, QModel};
        use tch::Device;

        let model = QModel::new(
            &MlpConfig::default(),
            DiscreteActionSpec {
                num_observation_features: 2,
                num_actions: 2,
            },
            Device::Cpu,
        );
        let optimizer = OptimizerDef::default()
            .build_optimizer(model.var_store(), 1e-3)
            .unwrap();
        drop(optimizer);
    }
}
