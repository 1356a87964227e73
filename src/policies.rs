//! Action selection policies
use crate::agents::ConfigError;
use crate::Prng;
use rand::Rng;

/// Selects an action from a reward-per-action estimate.
///
/// `step` is the shared observation counter, supplied externally so that
/// schedules (like epsilon annealing) depend only on global progress and not
/// on call order.
pub trait Policy: Send {
    fn select_action(&mut self, values: &[f32], step: u64, rng: &mut Prng) -> usize;

    /// Current exploration parameter, if the policy has one.
    fn exploration_rate(&self, _step: u64) -> Option<f64> {
        None
    }

    fn clone_box(&self) -> Box<dyn Policy>;
}

impl Clone for Box<dyn Policy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Index of the maximum value. Ties break to the first index.
pub fn greedy_action(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = i;
        }
    }
    best
}

/// Exploitation-only policy: always the action with the maximum estimate.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Greedy;

impl Policy for Greedy {
    fn select_action(&mut self, values: &[f32], _step: u64, _rng: &mut Prng) -> usize {
        greedy_action(values)
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(*self)
    }
}

/// Uniformly random action selection.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Random;

impl Policy for Random {
    fn select_action(&mut self, values: &[f32], _step: u64, rng: &mut Prng) -> usize {
        rng.gen_range(0..values.len())
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(*self)
    }
}

/// Epsilon-greedy with a linear anneal schedule.
///
/// Epsilon interpolates from `eps_start` down to `eps_final` over
/// `anneal_steps` globally observed steps and is a pure function of the
/// supplied step count.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EpsilonGreedy {
    eps_start: f64,
    eps_final: f64,
    anneal_steps: u64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_final: 0.1,
            anneal_steps: 20_000,
        }
    }
}

impl EpsilonGreedy {
    pub fn new(eps_start: f64, eps_final: f64, anneal_steps: u64) -> Result<Self, ConfigError> {
        if eps_final > eps_start || anneal_steps == 0 || !(0.0..=1.0).contains(&eps_start) {
            return Err(ConfigError::InvalidEpsilonSchedule {
                eps_start,
                eps_final,
                anneal_steps,
            });
        }
        Ok(Self {
            eps_start,
            eps_final,
            anneal_steps,
        })
    }

    /// Exploration probability at the given global step.
    #[allow(clippy::cast_precision_loss)]
    pub fn epsilon(&self, step: u64) -> f64 {
        if step >= self.anneal_steps {
            return self.eps_final;
        }
        let progress = step as f64 / self.anneal_steps as f64;
        self.eps_start + (self.eps_final - self.eps_start) * progress
    }
}

impl Policy for EpsilonGreedy {
    fn select_action(&mut self, values: &[f32], step: u64, rng: &mut Prng) -> usize {
        if rng.gen::<f64>() < self.epsilon(step) {
            rng.gen_range(0..values.len())
        } else {
            greedy_action(values)
        }
    }

    fn exploration_rate(&self, step: u64) -> Option<f64> {
        Some(self.epsilon(step))
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn greedy_selects_argmax() {
        let mut policy = Greedy;
        let mut rng = Prng::seed_from_u64(0);
        assert_eq!(policy.select_action(&[0.1, 0.5, 0.2], 0, &mut rng), 1);
        assert_eq!(policy.select_action(&[-1.0, -0.5, -2.0], 10, &mut rng), 1);
    }

    #[test]
    fn greedy_ties_break_to_first_index() {
        assert_eq!(greedy_action(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(greedy_action(&[0.0, 0.7, 0.7]), 1);
    }

    #[test]
    fn epsilon_schedule_endpoints() {
        let policy = EpsilonGreedy::new(1.0, 0.1, 100).unwrap();
        assert_eq!(policy.epsilon(0), 1.0);
        assert_eq!(policy.epsilon(100), 0.1);
        assert_eq!(policy.epsilon(1_000_000), 0.1);
    }

    #[test]
    fn epsilon_schedule_is_linear_and_monotonic() {
        let policy = EpsilonGreedy::new(1.0, 0.0, 100).unwrap();
        let mut prev = policy.epsilon(0);
        for step in 1..=100 {
            let eps = policy.epsilon(step);
            assert!(eps <= prev);
            assert!((eps - (1.0 - step as f64 / 100.0)).abs() < 1e-12);
            prev = eps;
        }
    }

    #[test]
    fn epsilon_zero_acts_greedily() {
        let mut policy = EpsilonGreedy::new(0.0, 0.0, 1).unwrap();
        let mut rng = Prng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(policy.select_action(&[0.0, 1.0, 0.5], 0, &mut rng), 1);
        }
    }

    #[rstest]
    #[case(0.1, 0.5, 100)] // increasing schedule
    #[case(1.0, 0.1, 0)] // no anneal steps
    #[case(1.5, 0.1, 100)] // epsilon above 1
    fn invalid_schedules_rejected(
        #[case] eps_start: f64,
        #[case] eps_final: f64,
        #[case] anneal_steps: u64,
    ) {
        assert!(EpsilonGreedy::new(eps_start, eps_final, anneal_steps).is_err());
    }

    #[test]
    fn random_stays_in_range() {
        let mut policy = Random;
        let mut rng = Prng::seed_from_u64(2);
        for _ in 0..50 {
            assert!(policy.select_action(&[0.0, 0.0, 0.0], 0, &mut rng) < 3);
        }
    }
}
