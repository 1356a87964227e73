//! Logging statistics from training runs
mod cli;
mod tensorboard;

pub use cli::CLILogger;
pub use tensorboard::TensorBoardLogger;

/// Training run events that group logged values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// One environment step.
    Step,
    /// One learner reporting period (episode-boundary summary).
    Episode,
    /// One coordinator evaluation period.
    Epoch,
}

pub const EVENTS: [Event; 3] = [Event::Step, Event::Episode, Event::Epoch];

/// A value that can be logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loggable {
    /// Nothing. May still produce a placeholder entry for the name.
    Nothing,
    /// A scalar value. Aggregated by taking means.
    Scalar(f64),
}

impl From<f64> for Loggable {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<f32> for Loggable {
    fn from(value: f32) -> Self {
        Self::Scalar(value.into())
    }
}

/// Log statistics from a training run.
pub trait Logger {
    /// Log a value under a name, grouped by event.
    fn log(&mut self, event: Event, name: &str, value: Loggable);

    /// Mark the end of an event instance.
    fn done(&mut self, event: Event);

    /// Flush any buffered output.
    fn flush(&mut self) {}
}

/// Logger that does nothing
impl Logger for () {
    fn log(&mut self, _: Event, _: &str, _: Loggable) {}

    fn done(&mut self, _: Event) {}
}

/// Forward to both loggers of a pair.
impl<A: Logger, B: Logger> Logger for (A, B) {
    fn log(&mut self, event: Event, name: &str, value: Loggable) {
        self.0.log(event, name, value);
        self.1.log(event, name, value);
    }

    fn done(&mut self, event: Event) {
        self.0.done(event);
        self.1.done(event);
    }

    fn flush(&mut self) {
        self.0.flush();
        self.1.flush();
    }
}

impl<T: Logger + ?Sized> Logger for &mut T {
    fn log(&mut self, event: Event, name: &str, value: Loggable) {
        T::log(self, event, name, value)
    }

    fn done(&mut self, event: Event) {
        T::done(self, event)
    }

    fn flush(&mut self) {
        T::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct RecordingLogger {
        scalars: HashMap<String, Vec<f64>>,
    }

    impl Logger for RecordingLogger {
        fn log(&mut self, _: Event, name: &str, value: Loggable) {
            if let Loggable::Scalar(v) = value {
                self.scalars.entry(name.into()).or_default().push(v);
            }
        }

        fn done(&mut self, _: Event) {}
    }

    #[test]
    fn pair_logger_forwards_to_both() {
        let mut logger = (RecordingLogger::default(), RecordingLogger::default());
        logger.log(Event::Step, "reward", 1.5.into());
        logger.done(Event::Step);
        assert_eq!(logger.0.scalars["reward"], vec![1.5]);
        assert_eq!(logger.1.scalars["reward"], vec![1.5]);
    }
}
