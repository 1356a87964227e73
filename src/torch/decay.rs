//! Learning rate decay schedules

/// Learning rate schedule as a function of the optimizer step count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecaySchedule {
    /// No decay
    Constant,
    /// Polynomial decay towards `end_learning_rate` over `decay_steps` steps.
    Polynomial {
        end_learning_rate: f64,
        decay_steps: u64,
        power: f64,
    },
    /// Multiply by `decay_rate` every `decay_steps` steps (continuously).
    Exponential { decay_rate: f64, decay_steps: u64 },
}

impl Default for DecaySchedule {
    fn default() -> Self {
        Self::Constant
    }
}

impl DecaySchedule {
    /// Learning rate at the given optimizer step.
    #[allow(clippy::cast_precision_loss)]
    pub fn learning_rate(&self, base: f64, step: u64) -> f64 {
        match *self {
            Self::Constant => base,
            Self::Polynomial {
                end_learning_rate,
                decay_steps,
                power,
            } => {
                let progress = (step.min(decay_steps) as f64) / (decay_steps as f64);
                (base - end_learning_rate) * (1.0 - progress).powf(power) + end_learning_rate
            }
            Self::Exponential {
                decay_rate,
                decay_steps,
            } => base * decay_rate.powf(step as f64 / decay_steps as f64),
        }
    }
}
