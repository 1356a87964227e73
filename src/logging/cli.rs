//! Command-line logger
use super::{Event, Loggable, Logger, EVENTS};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use yansi::Paint;

/// Logger that periodically prints grouped summaries to stdout.
///
/// Scalars logged under the same event and name between displays are averaged.
pub struct CLILogger {
    events: HashMap<Event, EventLog>,
    display_period: Duration,
    last_display_time: Instant,
}

impl CLILogger {
    pub fn new(display_period: Duration) -> Self {
        Self {
            events: EVENTS.iter().map(|e| (*e, EventLog::default())).collect(),
            display_period,
            last_display_time: Instant::now(),
        }
    }

    /// Display the pending summaries and clear all stored data.
    pub fn display(&mut self) {
        for event in EVENTS {
            let event_log = self.events.get_mut(&event).expect("all events are mapped");
            let count = event_log.index - event_log.summary_start_index;
            if count == 0 {
                continue;
            }
            println!(
                "{} {:?} {} - {}",
                Paint::blue("====").bold(),
                event,
                event_log.summary_start_index,
                event_log.index - 1
            );
            for (name, aggregate) in &event_log.aggregates {
                println!("{}: {}", Paint::green(name), aggregate.mean());
            }
            event_log.aggregates.clear();
            event_log.summary_start_index = event_log.index;
        }
        self.last_display_time = Instant::now();
    }
}

impl Logger for CLILogger {
    fn log(&mut self, event: Event, name: &str, value: Loggable) {
        let value = match value {
            Loggable::Scalar(value) => value,
            Loggable::Nothing => return,
        };
        let aggregates = &mut self
            .events
            .get_mut(&event)
            .expect("all events are mapped")
            .aggregates;
        if let Some(aggregate) = aggregates.get_mut(name) {
            aggregate.update(value);
        } else {
            aggregates.insert(name.into(), ScalarAggregate::new(value));
        }
    }

    fn done(&mut self, event: Event) {
        self.events.get_mut(&event).expect("all events are mapped").index += 1;
        if self.last_display_time.elapsed() >= self.display_period {
            self.display();
        }
    }

    fn flush(&mut self) {
        self.display();
    }
}

impl Drop for CLILogger {
    fn drop(&mut self) {
        // Ensure everything is flushed.
        self.display();
    }
}

#[derive(Debug, Default)]
struct EventLog {
    /// Global index for this event
    index: u64,
    /// Value of `index` at the start of this summary period
    summary_start_index: u64,
    aggregates: BTreeMap<String, ScalarAggregate>,
}

#[derive(Debug)]
struct ScalarAggregate {
    sum: f64,
    count: u64,
}

impl ScalarAggregate {
    const fn new(value: f64) -> Self {
        Self {
            sum: value,
            count: 1,
        }
    }

    fn update(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}
