//! N-step discounted return targets

/// Compute n-step discounted targets for a reward trajectory.
///
/// The bootstrap value estimates the return from the step following the
/// final reward. Targets are produced by the backward recurrence
/// `out[i] = rewards[i] + gamma * out[i + 1]` with
/// `out[len - 1] = rewards[len - 1] + gamma * bootstrap`.
pub fn discounted_returns(rewards: &[f32], gamma: f32, bootstrap: f32) -> Vec<f32> {
    let mut targets = vec![0.0; rewards.len()];
    let mut running = bootstrap;
    for (target, reward) in targets.iter_mut().zip(rewards).rev() {
        running = reward + gamma * running;
        *target = running;
    }
    targets
}
