//! Progress reporting for pipeline runs.
//!
//! The orchestrator reports through a `ProgressReporter`, which logs every update,
//! keeps percentages non-decreasing and forwards to a `ProgressSink`. Sinks must not
//! block: the pipeline never waits on a consumer.

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cv::models::ProcessedCv;

/// Fixed checkpoints. Percentages are tied to pipeline position only.
pub mod checkpoint {
    pub const INITIALIZING: u8 = 5;
    pub const STRATEGY_STRUCTURE: u8 = 15;
    pub const STRATEGY_QUALITY: u8 = 20;
    pub const STRATEGY_DONE: u8 = 25;
    pub const STRATEGY_FOCUS: u8 = 30;
    pub const STRATEGY_PRIORITIES: u8 = 35;
    pub const EXTRACTION_START: u8 = 40;
    pub const EXTRACTION_SKILLS: u8 = 45;
    pub const EXTRACTION_EXPERIENCE: u8 = 50;
    pub const EXTRACTION_DONE: u8 = 60;
    pub const ENHANCEMENT_START: u8 = 70;
    pub const ENHANCEMENT_CHALLENGES: u8 = 75;
    pub const ENHANCEMENT_SKILLS: u8 = 80;
    pub const ENHANCEMENT_STRUCTURE: u8 = 85;
    pub const ENHANCEMENT_FINALIZING: u8 = 90;
    pub const FINAL: u8 = 95;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub message: String,
    pub percentage: u8,
}

/// Everything a transport needs to stream one run: progress, then exactly one terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Progress(ProgressUpdate),
    Completed(Box<ProcessedCv>),
    Failed { message: String },
}

impl PipelineEvent {
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineEvent::Progress(_))
    }

    /// JSON payload sent to browser clients.
    pub fn to_payload(&self) -> Value {
        match self {
            PipelineEvent::Progress(update) => json!({
                "message": update.message,
                "percentage": update.percentage,
            }),
            PipelineEvent::Completed(cv) => json!({
                "success": true,
                "data": cv,
                "done": true,
            }),
            PipelineEvent::Failed { message } => json!({
                "error": message,
                "done": true,
            }),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[cfg(test)]
impl ProgressSink for NoopSink {
    fn emit(&self, _update: ProgressUpdate) {}
}

/// Forwards events into an unbounded channel. Sends never block; once the receiver is
/// gone, events are dropped and the run carries on.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Sends an event on the same ordered channel as progress updates.
    pub fn send(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("progress receiver dropped; event discarded");
        }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, update: ProgressUpdate) {
        self.send(PipelineEvent::Progress(update));
    }
}

/// Per-run reporter. Rejects updates that would move the percentage backwards.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, last: None }
    }

    pub fn report(&mut self, message: impl Into<String>, percentage: u8) {
        let message = message.into();
        if percentage > 100 || self.last.is_some_and(|last| percentage < last) {
            warn!(
                percentage,
                last = ?self.last,
                "Dropping out-of-order progress update: {message}"
            );
            return;
        }
        info!("Progress: {percentage}% - {message}");
        self.last = Some(percentage);
        self.sink.emit(ProgressUpdate {
            message,
            percentage,
        });
    }

    #[cfg(test)]
    pub fn last_percentage(&self) -> Option<u8> {
        self.last
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::{ProgressSink, ProgressUpdate};

    /// Collects every update for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        updates: Mutex<Vec<ProgressUpdate>>,
    }

    impl RecordingSink {
        pub fn updates(&self) -> Vec<ProgressUpdate> {
            self.updates.lock().unwrap().clone()
        }

        pub fn percentages(&self) -> Vec<u8> {
            self.updates().iter().map(|u| u.percentage).collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn emit(&self, update: ProgressUpdate) {
            self.updates.lock().unwrap().push(update);
        }
    }
}
