//! Asynchronous n-step deep Q-learning
//!
//! Several learner threads act in private environment copies and push
//! gradients into a shared [`ParamServer`] while a coordinator thread
//! evaluates, checkpoints and refreshes the target network.
use super::{ConfigError, DqnAgent};
use crate::envs::{Environment, UnsupportedSpaceError};
use crate::logging::{Event, Logger};
use crate::policies::{EpsilonGreedy, Policy};
use crate::torch::params::GradientError;
use crate::torch::{latest_checkpoint, CheckpointMeta, MlpConfig, ParamServer, TrainGraphConfig};
use crate::utils::{discounted_returns, IncrementalStats};
use crate::{Prng, RLError};
use crossbeam::channel::{self, Sender};
use crossbeam::select;
use rand::SeedableRng;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tch::{Device, TchError};

/// Training-time reward clip bounds. Evaluation rewards are never clipped.
const REWARD_CLIP: (f64, f64) = (-1.0, 1.0);

/// Supervisory loop polling period
const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Exploration policy assignment across learner threads.
pub enum PolicyAssignment {
    /// Every learner runs a copy of the same policy.
    Broadcast(Box<dyn Policy>),
    /// One policy per learner, matched by index. The length must equal the
    /// number of learner threads.
    PerLearner(Vec<Box<dyn Policy>>),
}

impl Default for PolicyAssignment {
    fn default() -> Self {
        Self::Broadcast(Box::new(EpsilonGreedy::default()))
    }
}

impl PolicyAssignment {
    fn into_policies(self, num_threads: usize) -> Result<Vec<Box<dyn Policy>>, ConfigError> {
        match self {
            Self::Broadcast(policy) => Ok((0..num_threads).map(|_| policy.clone()).collect()),
            Self::PerLearner(policies) => {
                if policies.len() == num_threads {
                    Ok(policies)
                } else {
                    Err(ConfigError::PolicyCountMismatch {
                        policies: policies.len(),
                        num_threads,
                    })
                }
            }
        }
    }
}

/// Options for one asynchronous training run.
pub struct TrainOptions {
    /// Number of learner threads.
    pub num_threads: usize,
    /// Total observation step budget across all learners.
    pub steps: u64,
    /// Directory for checkpoints and event files.
    pub log_dir: PathBuf,
    /// Observation steps between target network refreshes.
    pub target_freq: u64,
    /// Observation steps between evaluations / checkpoints, and the minimum
    /// spacing of per-learner progress reports.
    pub log_freq: u64,
    pub graph: TrainGraphConfig,
    pub policy: PolicyAssignment,
    /// Reward discount factor.
    pub gamma: f32,
    /// Maximum rollout length before a gradient update.
    pub batch_size: usize,
    /// Render the evaluation environment during evaluation episodes.
    pub render: bool,
    /// Start from fresh parameters even if `log_dir` holds a checkpoint.
    pub ignore_checkpoint: bool,
    /// Number of greedy evaluation episodes per evaluation period.
    pub test_episodes: usize,
    /// Step cap for evaluation episodes.
    pub max_episode_steps: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            num_threads: 2,
            steps: 80_000,
            log_dir: PathBuf::from("data/async-dqn"),
            target_freq: 40_000,
            log_freq: 10_000,
            graph: TrainGraphConfig::default(),
            policy: PolicyAssignment::default(),
            gamma: 0.99,
            batch_size: 5,
            render: false,
            ignore_checkpoint: false,
            test_episodes: 3,
            max_episode_steps: 100_000,
        }
    }
}

/// Message from a learner thread to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnerReport {
    Progress {
        id: usize,
        /// Global observation step at the time of the report.
        step: u64,
        /// Episodes completed since the previous report.
        episodes: u64,
        reward_mean: f64,
        reward_min: f64,
        reward_max: f64,
        /// Mean of the bootstrap values used for non-terminal rollouts.
        q_mean: f64,
        epsilon: Option<f64>,
    },
    Failed { id: usize, error: String },
}

/// Asynchronous n-step Q-learning agent.
///
/// Wraps an evaluation replica plus, once the training graph is built, a
/// shared [`ParamServer`] that learner threads train against.
pub struct AsyncDqnAgent {
    agent: DqnAgent,
    net_config: MlpConfig,
    device: Device,
    server: Option<Arc<ParamServer>>,
}

impl AsyncDqnAgent {
    pub fn new(
        env: Box<dyn Environment>,
        net_config: MlpConfig,
        device: Device,
        seed: u64,
    ) -> Result<Self, UnsupportedSpaceError> {
        Ok(Self {
            agent: DqnAgent::new(env, &net_config, device, seed)?,
            net_config,
            device,
            server: None,
        })
    }

    /// Build the shared training graph.
    ///
    /// Idempotent: once built, later calls (and later `train` invocations)
    /// keep the existing shared state so that training may resume.
    pub fn prepare_train(&mut self, graph: &TrainGraphConfig) -> Result<(), RLError> {
        if self.server.is_some() {
            eprintln!("warning: the training graph is already built; keeping it");
            return Ok(());
        }
        let server = ParamServer::new(&self.net_config, self.agent.spec(), self.device, graph)?;
        self.server = Some(Arc::new(server));
        Ok(())
    }

    /// The shared parameter server, once `prepare_train` has run.
    pub fn server(&self) -> Option<&Arc<ParamServer>> {
        self.server.as_ref()
    }

    /// Action values for one observation, from the latest shared parameters
    /// when a training graph exists.
    pub fn predict(&mut self, observation: &[f32]) -> Result<Vec<f32>, TchError> {
        if let Some(server) = &self.server {
            self.agent.sync_from(server)?;
        }
        Ok(self.agent.predict(observation))
    }

    /// Run greedy evaluation episodes against the latest parameters.
    pub fn evaluate(
        &mut self,
        episodes: usize,
        max_episode_steps: u64,
        render: bool,
    ) -> Result<IncrementalStats, TchError> {
        if let Some(server) = &self.server {
            self.agent.sync_from(server)?;
        }
        Ok(self.agent.evaluate(episodes, max_episode_steps, render))
    }

    /// Checkpoint the current parameters (shared if available) into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, RLError> {
        match &self.server {
            Some(server) => Ok(server.save(dir.as_ref())?),
            None => Ok(self.agent.save(dir.as_ref(), TrainGraphConfig::default().saver_keep)?),
        }
    }

    /// Restore the newest checkpoint in `dir`.
    pub fn load<P: AsRef<Path>>(&mut self, dir: P) -> Result<CheckpointMeta, RLError> {
        match &self.server {
            Some(server) => Ok(server.restore_latest(dir.as_ref())?),
            None => Ok(self.agent.load(dir.as_ref())?),
        }
    }

    /// Train until the global observation budget is spent.
    ///
    /// Spawns `num_threads` learner threads over private environment copies
    /// and supervises them: periodically evaluates and checkpoints, refreshes
    /// the target network and relays learner progress to `logger`. A learner
    /// failure is reported and the remaining learners keep training.
    pub fn train(&mut self, options: TrainOptions, logger: &mut dyn Logger) -> Result<(), RLError> {
        let TrainOptions {
            num_threads,
            steps,
            log_dir,
            target_freq,
            log_freq,
            graph,
            policy,
            gamma,
            batch_size,
            render,
            ignore_checkpoint,
            test_episodes,
            max_episode_steps,
        } = options;
        if num_threads < 1 {
            return Err(ConfigError::InvalidNumThreads(num_threads).into());
        }
        // A zero-length rollout would never step the environment or advance
        // the observation counter, so learners would spin forever.
        if batch_size < 1 {
            return Err(ConfigError::InvalidBatchSize.into());
        }
        let policies = policy.into_policies(num_threads)?;

        if self.server.is_none() {
            self.prepare_train(&graph)?;
        }
        let server = Arc::clone(self.server.as_ref().expect("prepare_train builds the server"));
        if !ignore_checkpoint && latest_checkpoint(&log_dir)?.is_some() {
            let meta = server.restore_latest(&log_dir)?;
            println!(
                "restored checkpoint from {:?} at observation step {}",
                log_dir, meta.observation_steps
            );
        }

        let (report_send, report_recv) = channel::unbounded();
        let config = LearnerConfig {
            gamma,
            batch_size,
            log_freq,
        };
        let mut handles = Vec::with_capacity(num_threads);
        for (id, policy) in policies.into_iter().enumerate() {
            let learner = ThreadLearner::new(
                id,
                self.agent.env_copy(),
                &self.net_config,
                self.device,
                policy,
                Arc::clone(&server),
                config,
                report_send.clone(),
            )?;
            handles.push(thread::spawn(move || learner.run()));
        }
        // Learners hold the remaining senders; disconnect means all are done.
        drop(report_send);

        let ticker = channel::tick(TICK_PERIOD);
        let mut perf = PerfTracker::new(&server);
        let mut last_summary_step = server.observation_steps();
        let mut last_target_step = last_summary_step;
        let mut learners_done = false;
        while !learners_done && server.observation_steps() < steps {
            select! {
                recv(report_recv) -> message => match message {
                    Ok(report) => log_report(logger, &report),
                    Err(_) => learners_done = true,
                },
                recv(ticker) -> _ => {
                    let step = server.observation_steps();
                    if step - last_summary_step >= log_freq {
                        last_summary_step = step;
                        self.write_summary(
                            &server,
                            test_episodes,
                            max_episode_steps,
                            render,
                            &mut perf,
                            logger,
                        )?;
                        server.save(&log_dir)?;
                    }
                    if step - last_target_step >= target_freq {
                        last_target_step = step;
                        server.target_update()?;
                    }
                },
            }
        }

        server.request_stop();
        for handle in handles {
            if handle.join().is_err() {
                eprintln!("warning: a learner thread panicked");
            }
        }
        while let Ok(report) = report_recv.try_recv() {
            log_report(logger, &report);
        }

        self.write_summary(
            &server,
            test_episodes,
            max_episode_steps,
            render,
            &mut perf,
            logger,
        )?;
        server.save(&log_dir)?;
        logger.flush();
        Ok(())
    }

    /// Evaluate the current shared parameters and log the outcome.
    fn write_summary(
        &mut self,
        server: &ParamServer,
        test_episodes: usize,
        max_episode_steps: u64,
        render: bool,
        perf: &mut PerfTracker,
        logger: &mut dyn Logger,
    ) -> Result<(), RLError> {
        self.agent.sync_from(server)?;
        let stats = self.agent.evaluate(test_episodes, max_episode_steps, render);
        let (obs_per_sec, updates_per_sec) = perf.measure(server);
        logger.log(Event::Epoch, "eval/reward_mean", stats.average().into());
        logger.log(
            Event::Epoch,
            "eval/reward_min",
            stats.min().unwrap_or(0.0).into(),
        );
        logger.log(
            Event::Epoch,
            "eval/reward_max",
            stats.max().unwrap_or(0.0).into(),
        );
        logger.log(
            Event::Epoch,
            "performance/observations_per_sec",
            obs_per_sec.into(),
        );
        logger.log(
            Event::Epoch,
            "performance/updates_per_sec",
            updates_per_sec.into(),
        );
        #[allow(clippy::cast_precision_loss)]
        logger.log(
            Event::Epoch,
            "step/observation",
            (server.observation_steps() as f64).into(),
        );
        logger.done(Event::Epoch);
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_report(logger: &mut dyn Logger, report: &LearnerReport) {
    match *report {
        LearnerReport::Progress {
            id,
            step,
            episodes,
            reward_mean,
            reward_min,
            reward_max,
            q_mean,
            epsilon,
        } => {
            // Each learner gets its own tag scope so per-learner statistics
            // are not merged by the aggregating loggers.
            let scope = format!("learner_{}", id);
            logger.log(
                Event::Episode,
                &format!("{}/reward_mean", scope),
                reward_mean.into(),
            );
            logger.log(
                Event::Episode,
                &format!("{}/reward_min", scope),
                reward_min.into(),
            );
            logger.log(
                Event::Episode,
                &format!("{}/reward_max", scope),
                reward_max.into(),
            );
            logger.log(Event::Episode, &format!("{}/q_mean", scope), q_mean.into());
            logger.log(
                Event::Episode,
                &format!("{}/episodes", scope),
                (episodes as f64).into(),
            );
            logger.log(Event::Episode, "step/observation", (step as f64).into());
            if let Some(epsilon) = epsilon {
                logger.log(
                    Event::Episode,
                    &format!("{}/epsilon", scope),
                    epsilon.into(),
                );
            }
            logger.done(Event::Episode);
        }
        LearnerReport::Failed { id, ref error } => {
            eprintln!("warning: learner {} stopped with an error: {}", id, error);
        }
    }
}

/// Observation / update throughput between measurements.
struct PerfTracker {
    last_time: Instant,
    last_observations: u64,
    last_updates: u64,
}

impl PerfTracker {
    fn new(server: &ParamServer) -> Self {
        Self {
            last_time: Instant::now(),
            last_observations: server.observation_steps(),
            last_updates: server.optimizer_steps(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure(&mut self, server: &ParamServer) -> (f64, f64) {
        let elapsed = self.last_time.elapsed().as_secs_f64().max(1e-9);
        let observations = server.observation_steps();
        let updates = server.optimizer_steps();
        let rates = (
            (observations - self.last_observations) as f64 / elapsed,
            (updates - self.last_updates) as f64 / elapsed,
        );
        self.last_time = Instant::now();
        self.last_observations = observations;
        self.last_updates = updates;
        rates
    }
}

#[derive(Debug, Clone, Copy)]
struct LearnerConfig {
    gamma: f32,
    batch_size: usize,
    log_freq: u64,
}

#[derive(Debug, thiserror::Error)]
enum LearnerError {
    #[error("parameter synchronization failed")]
    Sync(#[from] TchError),
    #[error("gradient update failed")]
    Gradient(#[from] GradientError),
}

/// One asynchronous learner: a private environment and local parameter
/// replica, trained against the shared server.
struct ThreadLearner {
    id: usize,
    agent: DqnAgent,
    policy: Box<dyn Policy>,
    server: Arc<ParamServer>,
    config: LearnerConfig,
    reports: Sender<LearnerReport>,
    rng: Prng,
    episode_reward: f64,
    reward_stats: IncrementalStats,
    q_stats: IncrementalStats,
}

/// An n-step rollout segment.
///
/// The successor observation and terminal flag live in the learner's loop
/// state; the segment stores the transitions to be turned into one update.
struct Rollout {
    observations: Vec<Vec<f32>>,
    actions: Vec<usize>,
    /// Clipped rewards
    rewards: Vec<f32>,
}

impl Rollout {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            observations: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
        }
    }

    fn len(&self) -> usize {
        self.observations.len()
    }
}

impl ThreadLearner {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: usize,
        env: Box<dyn Environment>,
        net_config: &MlpConfig,
        device: Device,
        policy: Box<dyn Policy>,
        server: Arc<ParamServer>,
        config: LearnerConfig,
        reports: Sender<LearnerReport>,
    ) -> Result<Self, UnsupportedSpaceError> {
        let seed = id as u64 + 1;
        Ok(Self {
            id,
            agent: DqnAgent::new(env, net_config, device, seed)?,
            policy,
            server,
            config,
            reports,
            rng: Prng::seed_from_u64(seed),
            episode_reward: 0.0,
            reward_stats: IncrementalStats::new(),
            q_stats: IncrementalStats::new(),
        })
    }

    fn run(mut self) {
        if let Err(error) = self.try_run() {
            let _ = self.reports.send(LearnerReport::Failed {
                id: self.id,
                error: error.to_string(),
            });
        }
    }

    fn try_run(&mut self) -> Result<(), LearnerError> {
        let mut observation = self.agent.reset_env();
        let mut terminal = false;
        let mut last_report_step = self.server.observation_steps();
        while !self.server.stop_requested() {
            self.agent.sync_from(&self.server)?;
            if terminal {
                observation = self.agent.reset_env();
                terminal = false;
            }
            let rollout = self.collect_rollout(&mut observation, &mut terminal);

            let bootstrap = if terminal {
                self.reward_stats.add(self.episode_reward);
                self.episode_reward = 0.0;
                0.0
            } else {
                // One-step lookahead from the successor observation.
                let values = self.server.target_values(&observation);
                let max_value = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                self.q_stats.add(max_value.into());
                max_value
            };
            let targets = discounted_returns(&rollout.rewards, self.config.gamma, bootstrap);
            let (_, gradients) =
                self.agent
                    .model()
                    .loss_gradients(&rollout.observations, &rollout.actions, &targets);
            self.server.apply_gradients(&gradients)?;

            if terminal && self.config.log_freq > 0 {
                let step = self.server.observation_steps();
                if step - last_report_step > self.config.log_freq {
                    last_report_step = step;
                    self.send_progress(step);
                }
            }
        }
        // Flush statistics accumulated since the last periodic report.
        if self.reward_stats.count() > 0 {
            self.send_progress(self.server.observation_steps());
        }
        Ok(())
    }

    fn collect_rollout(&mut self, observation: &mut Vec<f32>, terminal: &mut bool) -> Rollout {
        let mut rollout = Rollout::with_capacity(self.config.batch_size);
        while !*terminal && rollout.len() < self.config.batch_size {
            let step = self.server.next_observation_step();
            let values = self.agent.predict(observation);
            let action = self.policy.select_action(&values, step, &mut self.rng);
            let outcome = self.agent.step_env(action);
            self.episode_reward += outcome.reward;
            #[allow(clippy::cast_possible_truncation)]
            let clipped = outcome.reward.clamp(REWARD_CLIP.0, REWARD_CLIP.1) as f32;
            rollout
                .observations
                .push(mem::replace(observation, outcome.observation));
            rollout.actions.push(action);
            rollout.rewards.push(clipped);
            *terminal = outcome.terminal;
        }
        rollout
    }

    fn send_progress(&mut self, step: u64) {
        let episodes = self.reward_stats.count();
        let reward_min = self.reward_stats.min().unwrap_or(0.0);
        let reward_max = self.reward_stats.max().unwrap_or(0.0);
        let reward_mean = self.reward_stats.reset();
        let q_mean = self.q_stats.reset();
        let _ = self.reports.send(LearnerReport::Progress {
            id: self.id,
            step,
            episodes,
            reward_mean,
            reward_min,
            reward_max,
            q_mean,
            epsilon: self.policy.exploration_rate(step),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::testing::FixedRewardEnv;
    use crate::logging::Loggable;
    use crate::policies::Greedy;
    use crate::torch::{DecaySchedule, OptimizerDef, SgdConfig};
    use std::collections::HashMap;
    use std::fs;

    #[derive(Debug, Default)]
    struct RecordingLogger {
        scalars: HashMap<String, Vec<f64>>,
    }

    impl Logger for RecordingLogger {
        fn log(&mut self, _: Event, name: &str, value: Loggable) {
            if let Loggable::Scalar(value) = value {
                self.scalars.entry(name.into()).or_default().push(value);
            }
        }

        fn done(&mut self, _: Event) {}
    }

    fn agent() -> AsyncDqnAgent {
        AsyncDqnAgent::new(
            Box::new(FixedRewardEnv::new(1.0, 5)),
            MlpConfig {
                hidden_sizes: vec![8],
            },
            Device::Cpu,
            0,
        )
        .unwrap()
    }

    fn graph() -> TrainGraphConfig {
        TrainGraphConfig {
            optimizer: OptimizerDef::Sgd(SgdConfig::default()),
            learning_rate: 0.01,
            decay: DecaySchedule::Constant,
            gradient_clip: Some(40.0),
            saver_keep: 2,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("async-dqn-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn prepare_train_is_idempotent() {
        let mut agent = agent();
        agent.prepare_train(&graph()).unwrap();
        let first = Arc::clone(agent.server().unwrap());
        agent.prepare_train(&graph()).unwrap();
        assert!(Arc::ptr_eq(&first, agent.server().unwrap()));
    }

    #[test]
    fn zero_learner_threads_is_rejected() {
        let mut agent = agent();
        let options = TrainOptions {
            num_threads: 0,
            log_dir: temp_dir("zero-threads"),
            ..TrainOptions::default()
        };
        assert!(matches!(
            agent.train(options, &mut ()),
            Err(RLError::Config(ConfigError::InvalidNumThreads(0)))
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut agent = agent();
        let options = TrainOptions {
            batch_size: 0,
            log_dir: temp_dir("zero-batch"),
            ..TrainOptions::default()
        };
        assert!(matches!(
            agent.train(options, &mut ()),
            Err(RLError::Config(ConfigError::InvalidBatchSize))
        ));
    }

    #[test]
    fn per_learner_policy_count_must_match() {
        let mut agent = agent();
        let options = TrainOptions {
            num_threads: 3,
            policy: PolicyAssignment::PerLearner(vec![Box::new(Greedy), Box::new(Greedy)]),
            log_dir: temp_dir("policy-mismatch"),
            ..TrainOptions::default()
        };
        assert!(matches!(
            agent.train(options, &mut ()),
            Err(RLError::Config(ConfigError::PolicyCountMismatch {
                policies: 2,
                num_threads: 3,
            }))
        ));
    }

    #[test]
    fn learns_from_multiple_threads_and_checkpoints() {
        let dir = temp_dir("end-to-end");
        let mut agent = agent();
        let options = TrainOptions {
            num_threads: 2,
            steps: 300,
            log_dir: dir.clone(),
            target_freq: 100,
            log_freq: 25,
            graph: graph(),
            policy: PolicyAssignment::default(),
            gamma: 0.9,
            batch_size: 5,
            render: false,
            ignore_checkpoint: true,
            test_episodes: 1,
            max_episode_steps: 50,
        };
        let mut logger = RecordingLogger::default();
        agent.train(options, &mut logger).unwrap();

        let server = agent.server().unwrap();
        assert!(server.observation_steps() >= 300);
        assert!(server.optimizer_steps() > 0);

        // Every episode of this environment is worth exactly 5.0, and each
        // learner reports under its own tag scope.
        for learner in ["learner_0", "learner_1"] {
            let reward_means = &logger.scalars[&format!("{}/reward_mean", learner)];
            assert!(!reward_means.is_empty());
            for mean in reward_means {
                assert_eq!(*mean, 5.0);
            }
        }
        assert!(logger.scalars.contains_key("eval/reward_mean"));

        assert!(latest_checkpoint(&dir).unwrap().is_some());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn external_stop_request_ends_training_early() {
        let dir = temp_dir("external-stop");
        let mut agent = agent();
        agent.prepare_train(&graph()).unwrap();
        let server = Arc::clone(agent.server().unwrap());
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            server.request_stop();
        });

        let options = TrainOptions {
            num_threads: 2,
            steps: u64::MAX,
            log_dir: dir.clone(),
            log_freq: 1_000_000,
            graph: graph(),
            ignore_checkpoint: true,
            test_episodes: 1,
            max_episode_steps: 50,
            ..TrainOptions::default()
        };
        agent.train(options, &mut ()).unwrap();
        stopper.join().unwrap();

        // The budget was unreachable, so only the stop request can have
        // ended the run, and the final checkpoint must still exist.
        assert!(latest_checkpoint(&dir).unwrap().is_some());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_load_round_trip_preserves_state() {
        let dir = temp_dir("save-load");
        let mut source = agent();
        source.prepare_train(&graph()).unwrap();
        let server = Arc::clone(source.server().unwrap());
        for _ in 0..7 {
            server.next_observation_step();
        }
        let values = source.predict(&[0.5]).unwrap();
        source.save(&dir).unwrap();

        let mut restored = agent();
        restored.prepare_train(&graph()).unwrap();
        let meta = restored.load(&dir).unwrap();
        assert_eq!(meta.observation_steps, 7);
        assert_eq!(restored.server().unwrap().observation_steps(), 7);
        assert_eq!(restored.predict(&[0.5]).unwrap(), values);

        let _ = fs::remove_dir_all(&dir);
    }
}
