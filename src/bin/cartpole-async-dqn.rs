//! Train an asynchronous n-step Q-learning agent on cart-pole.
//!
//! Usage: cartpole-async-dqn [NUM_THREADS] [STEPS]
use reinforceflow::agents::{AsyncDqnAgent, PolicyAssignment, TrainOptions};
use reinforceflow::envs::CartPole;
use reinforceflow::logging::{CLILogger, TensorBoardLogger};
use reinforceflow::torch::{MlpConfig, OptimizerDef, TrainGraphConfig};
use reinforceflow::EpsilonGreedy;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tch::Device;

fn main() {
    let mut args = std::env::args().skip(1);
    let num_threads: usize = args
        .next()
        .map(|a| a.parse().expect("NUM_THREADS must be an integer"))
        .unwrap_or(4);
    let steps: u64 = args
        .next()
        .map(|a| a.parse().expect("STEPS must be an integer"))
        .unwrap_or(200_000);

    let log_dir = PathBuf::from("data/cartpole-async-dqn");
    let mut agent = AsyncDqnAgent::new(
        Box::new(CartPole::new(0)),
        MlpConfig::default(),
        Device::Cpu,
        0,
    )
    .expect("cart-pole has a discrete action space");

    let options = TrainOptions {
        num_threads,
        steps,
        log_dir: log_dir.clone(),
        target_freq: 10_000,
        log_freq: 5_000,
        graph: TrainGraphConfig {
            optimizer: OptimizerDef::from_name("adam").unwrap(),
            learning_rate: 1e-4,
            ..TrainGraphConfig::default()
        },
        policy: PolicyAssignment::Broadcast(Box::new(
            EpsilonGreedy::new(1.0, 0.05, 50_000).unwrap(),
        )),
        gamma: 0.99,
        batch_size: 5,
        test_episodes: 5,
        max_episode_steps: 500,
        ..TrainOptions::default()
    };

    // Ctrl-C asks the learners to finish their in-flight batch; train then
    // saves a final checkpoint before returning.
    agent
        .prepare_train(&options.graph)
        .expect("failed to build the training graph");
    let server = Arc::clone(agent.server().expect("prepare_train builds the server"));
    ctrlc::set_handler(move || server.request_stop())
        .expect("failed to install the interrupt handler");

    let mut logger = (
        CLILogger::new(Duration::from_secs(1)),
        TensorBoardLogger::new(&log_dir),
    );
    agent.train(options, &mut logger).expect("training failed");

    let stats = agent
        .evaluate(10, 500, false)
        .expect("evaluation failed");
    println!(
        "final greedy performance over 10 episodes: mean {:.1}, min {:.1}, max {:.1}",
        stats.average(),
        stats.min().unwrap_or(0.0),
        stats.max().unwrap_or(0.0)
    );
}
