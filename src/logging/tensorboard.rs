//! Tensorboard logger
use super::{Event, Loggable, Logger};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter as TbSummaryWriter;

/// Logger that saves scalar summaries to a tensorboard event file.
///
/// Values logged between `done` calls for an event are buffered and written
/// as one summary per event instance.
pub struct TensorBoardLogger {
    writer: TbSummaryWriter,
    pending: HashMap<Event, Vec<(String, f32)>>,
    summary_index: HashMap<Event, usize>,
}

impl fmt::Debug for TensorBoardLogger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TensorBoardLogger")
            .field("summary_index", &self.summary_index)
            .finish()
    }
}

impl TensorBoardLogger {
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Self {
        Self {
            writer: TbSummaryWriter::new(log_dir),
            pending: HashMap::new(),
            summary_index: HashMap::new(),
        }
    }
}

impl Logger for TensorBoardLogger {
    fn log(&mut self, event: Event, name: &str, value: Loggable) {
        #[allow(clippy::cast_possible_truncation)]
        if let Loggable::Scalar(value) = value {
            self.pending
                .entry(event)
                .or_default()
                .push((name.into(), value as f32));
        }
    }

    fn done(&mut self, event: Event) {
        let pending = match self.pending.get_mut(&event) {
            Some(pending) if !pending.is_empty() => pending,
            _ => return,
        };
        let index = self.summary_index.entry(event).or_insert(0);
        for (tag, value) in pending.drain(..) {
            self.writer.add_scalar(&tag, value, *index);
        }
        *index += 1;
        self.writer.flush();
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}
