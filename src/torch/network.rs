//! Q-value networks
use crate::envs::DiscreteActionSpec;
use std::borrow::Borrow;
use tch::nn::{self, Linear, LinearConfig, Module, Path, VarStore};
use tch::{Device, Kind, Reduction, Tensor};

/// Configuration for a fully-connected feed-forward network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlpConfig {
    /// Sizes of the hidden layers, in order. ReLU activations in between.
    pub hidden_sizes: Vec<usize>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![64, 64],
        }
    }
}

impl MlpConfig {
    pub fn build<'a, P: Borrow<Path<'a>>>(&self, vs: P, in_dim: i64, out_dim: i64) -> Mlp {
        Mlp::new(vs, in_dim, out_dim, self)
    }
}

/// Multi-layer perceptron
#[derive(Debug)]
pub struct Mlp {
    layers: Vec<Linear>,
}

impl Mlp {
    #[allow(clippy::cast_possible_wrap)]
    pub fn new<'a, P: Borrow<Path<'a>>>(
        vs: P,
        in_dim: i64,
        out_dim: i64,
        config: &MlpConfig,
    ) -> Self {
        let vs = vs.borrow();
        let mut layers = Vec::with_capacity(config.hidden_sizes.len() + 1);
        let mut prev_dim = in_dim;
        for (i, &size) in config.hidden_sizes.iter().enumerate() {
            layers.push(nn::linear(
                vs / format!("layer_{}", i),
                prev_dim,
                size as i64,
                LinearConfig::default(),
            ));
            prev_dim = size as i64;
        }
        layers.push(nn::linear(
            vs / "output",
            prev_dim,
            out_dim,
            LinearConfig::default(),
        ));
        Self { layers }
    }
}

impl Module for Mlp {
    fn forward(&self, input: &Tensor) -> Tensor {
        let (last, hidden) = self.layers.split_last().expect("at least an output layer");
        let mut out = input.shallow_clone();
        for layer in hidden {
            out = layer.forward(&out).relu();
        }
        last.forward(&out)
    }
}

/// An action-value network with its own variable store.
///
/// Every instance built from the same configuration has identically named
/// variables in the same registration order, so parameters and gradients can
/// be exchanged positionally between instances.
pub struct QModel {
    vs: VarStore,
    net: Mlp,
    device: Device,
    in_dim: i64,
    num_actions: i64,
}

impl QModel {
    #[allow(clippy::cast_possible_wrap)]
    pub fn new(config: &MlpConfig, spec: DiscreteActionSpec, device: Device) -> Self {
        let vs = VarStore::new(device);
        let in_dim = spec.num_observation_features as i64;
        let num_actions = spec.num_actions as i64;
        let net = config.build(&vs.root() / "network", in_dim, num_actions);
        Self {
            vs,
            net,
            device,
            in_dim,
            num_actions,
        }
    }

    pub const fn var_store(&self) -> &VarStore {
        &self.vs
    }

    pub fn var_store_mut(&mut self) -> &mut VarStore {
        &mut self.vs
    }

    pub fn trainable_variables(&self) -> Vec<Tensor> {
        self.vs.trainable_variables()
    }

    /// Action values for a single observation, without tracking gradients.
    pub fn values(&self, observation: &[f32]) -> Vec<f32> {
        tch::no_grad(|| {
            let input = Tensor::of_slice(observation)
                .reshape(&[1, self.in_dim])
                .to_device(self.device);
            Vec::<f32>::from(
                self.net
                    .forward(&input)
                    .squeeze_dim(0)
                    .to_device(Device::Cpu),
            )
        })
    }

    /// Mean squared error between the values of the taken actions and
    /// `targets`, back-propagated into the variables' gradients.
    ///
    /// Returns the loss and the gradient tensor of each trainable variable in
    /// registration order. Existing gradients are zeroed first.
    pub fn loss_gradients(
        &self,
        observations: &[Vec<f32>],
        actions: &[usize],
        targets: &[f32],
    ) -> (f64, Vec<Tensor>) {
        let variables = self.vs.trainable_variables();
        for variable in &variables {
            let mut grad = variable.grad();
            if grad.defined() {
                let _ = grad.zero_();
            }
        }

        let values = self.net.forward(&self.batch_input(observations));
        #[allow(clippy::cast_possible_wrap)]
        let action_indices: Vec<i64> = actions.iter().map(|&a| a as i64).collect();
        let taken_mask = Tensor::of_slice(&action_indices)
            .to_device(self.device)
            .one_hot(self.num_actions)
            .to_kind(Kind::Float);
        let taken_values = (values * taken_mask).sum_dim_intlist(&[1], false, Kind::Float);
        let target_values = Tensor::of_slice(targets).to_device(self.device);
        let loss = taken_values.mse_loss(&target_values, Reduction::Mean);
        loss.backward();

        let gradients = variables.iter().map(Tensor::grad).collect();
        (f64::from(&loss), gradients)
    }

    /// Run a throwaway backward pass so that every variable has a defined
    /// gradient tensor.
    pub fn prime_gradients(&self) {
        let input = Tensor::zeros(&[1, self.in_dim], (Kind::Float, self.device));
        self.net.forward(&input).sum(Kind::Float).backward();
    }

    #[allow(clippy::cast_possible_wrap)]
    fn batch_input(&self, observations: &[Vec<f32>]) -> Tensor {
        let batch_size = observations.len() as i64;
        let flat: Vec<f32> = observations.iter().flatten().copied().collect();
        Tensor::of_slice(&flat)
            .reshape(&[batch_size, self.in_dim])
            .to_device(self.device)
    }
}
