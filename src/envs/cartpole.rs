//! Cart-pole balancing environment
use super::{Environment, SpaceSpec, StepOutcome};
use crate::Prng;
use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};

/// Cart-pole environment.
///
/// A simulated cart on a track with a vertical pole attached by a hinge.
/// The goal is to keep the pole upright by pushing the cart left or right.
/// Dynamics and episode constants follow [Barto et al. (1983)][barto1983] as
/// implemented by the OpenAI Gym `CartPole-v1` environment.
///
/// [barto1983]: https://ieeexplore.ieee.org/document/6313077
#[derive(Debug, Clone)]
pub struct CartPole {
    constants: Constants,
    state: State,
    rng: Prng,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Constants {
    gravity: f64,
    mass_cart: f64,
    mass_pole: f64,
    /// Half the length of the pole (m)
    length_half_pole: f64,
    /// Magnitude of the force (N) applied by actions
    action_force: f64,
    /// Simulation time step (s)
    time_step: f64,
    /// Maximum absolute position (m) before the episode is ended
    max_pos: f64,
    /// Maximum absolute pole angle from vertical (radians) before the episode is ended
    max_angle: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length_half_pole: 0.5,
            action_force: 10.0,
            time_step: 0.02,
            max_pos: 2.4,
            max_angle: 12.0f64.to_radians(),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
struct State {
    cart_position: f64,
    cart_velocity: f64,
    pole_angle: f64,
    pole_angular_velocity: f64,
}

impl State {
    #[allow(clippy::cast_possible_truncation)]
    fn observation(&self) -> Vec<f32> {
        vec![
            self.cart_position as f32,
            self.cart_velocity as f32,
            self.pole_angle as f32,
            self.pole_angular_velocity as f32,
        ]
    }
}

impl CartPole {
    pub fn new(seed: u64) -> Self {
        Self {
            constants: Constants::default(),
            state: State::default(),
            rng: Prng::seed_from_u64(seed),
        }
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Environment for CartPole {
    fn observation_space(&self) -> SpaceSpec {
        SpaceSpec::Continuous { shape: vec![4] }
    }

    fn action_space(&self) -> SpaceSpec {
        SpaceSpec::Discrete { n: 2 }
    }

    fn reset(&mut self) -> Vec<f32> {
        let dist = Uniform::new_inclusive(-0.05, 0.05);
        self.state = State {
            cart_position: dist.sample(&mut self.rng),
            cart_velocity: dist.sample(&mut self.rng),
            pole_angle: dist.sample(&mut self.rng),
            pole_angular_velocity: dist.sample(&mut self.rng),
        };
        self.state.observation()
    }

    fn step(&mut self, action: usize) -> StepOutcome {
        let c = &self.constants;
        let applied_force = if action == 0 {
            -c.action_force
        } else {
            c.action_force
        };

        let s = &self.state;
        let total_mass = c.mass_cart + c.mass_pole;
        let mass_length_pole = c.mass_pole * c.length_half_pole;
        let cos_angle = s.pole_angle.cos();
        let sin_angle = s.pole_angle.sin();

        let temp = (applied_force
            + mass_length_pole * s.pole_angular_velocity * s.pole_angular_velocity * sin_angle)
            / total_mass;
        let angular_accel = (c.gravity * sin_angle - cos_angle * temp)
            / (c.length_half_pole
                * (4.0 / 3.0 - c.mass_pole * cos_angle * cos_angle / total_mass));
        let linear_accel = temp - mass_length_pole * angular_accel * cos_angle / total_mass;

        // Euler integration
        let dt = c.time_step;
        self.state = State {
            cart_position: s.cart_position + dt * s.cart_velocity,
            cart_velocity: s.cart_velocity + dt * linear_accel,
            pole_angle: s.pole_angle + dt * s.pole_angular_velocity,
            pole_angular_velocity: s.pole_angular_velocity + dt * angular_accel,
        };

        let terminal = self.state.cart_position.abs() > c.max_pos
            || self.state.pole_angle.abs() > c.max_angle;
        StepOutcome {
            observation: self.state.observation(),
            reward: 1.0,
            terminal,
        }
    }

    fn render(&self) {
        println!(
            "cart-pole: x = {:+.3} m, v = {:+.3} m/s, theta = {:+.3} rad, omega = {:+.3} rad/s",
            self.state.cart_position,
            self.state.cart_velocity,
            self.state.pole_angle,
            self.state.pole_angular_velocity
        );
    }

    fn boxed_copy(&self) -> Box<dyn Environment> {
        Box::new(Self::new(self.rng.clone().gen()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::DiscreteActionSpec;

    #[test]
    fn observation_has_four_features() {
        let mut env = CartPole::new(0);
        let obs = env.reset();
        assert_eq!(obs.len(), 4);
        let spec = DiscreteActionSpec::from_env(&env).unwrap();
        assert_eq!(spec.num_observation_features, 4);
        assert_eq!(spec.num_actions, 2);
    }

    #[test]
    fn constant_push_eventually_terminates() {
        let mut env = CartPole::new(1);
        env.reset();
        let mut terminated = false;
        for _ in 0..500 {
            let outcome = env.step(1);
            assert_eq!(outcome.reward, 1.0);
            if outcome.terminal {
                terminated = true;
                break;
            }
        }
        assert!(terminated, "pushing one way forever must drop the pole");
    }

    #[test]
    fn copy_is_independent() {
        let mut env = CartPole::new(2);
        env.reset();
        let mut copy = env.boxed_copy();
        copy.reset();
        copy.step(0);
        env.step(1); // must not panic or observe the copy's state
    }
}
