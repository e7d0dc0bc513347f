//! Progress reporting
//!
//! The transport layer (push channel, SSE, websocket) owns delivery to the
//! submitting client; the pipeline only sees this narrow observer interface.
//! Notifications are best-effort by construction: implementations must not
//! fail, and the channel reporter drops events once the receiver is gone.

use tokio::sync::mpsc;

/// Receives step/percentage notifications for a scan job
pub trait ProgressReporter: Send + Sync {
    fn report(&self, job_id: &str, step: &str, message: &str, percent: u8);
}

/// Logs progress through tracing; the default reporter for the CLI
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, job_id: &str, step: &str, message: &str, percent: u8) {
        tracing::info!("[{}] {} ({}%): {}", job_id, step, percent, message);
    }
}

/// One progress notification as seen by the transport layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub job_id: String,
    pub step: String,
    pub message: String,
    pub percent: u8,
}

/// Forwards progress events over a channel
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, job_id: &str, step: &str, message: &str, percent: u8) {
        // A closed receiver just means nobody is listening anymore
        let _ = self.tx.send(ProgressEvent {
            job_id: job_id.to_string(),
            step: step.to_string(),
            message: message.to_string(),
            percent,
        });
    }
}
