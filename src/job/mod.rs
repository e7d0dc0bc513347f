//! Job data model
//!
//! A [`Job`] is one user-submitted scan request: immutable identity and
//! payload plus the mutable lifecycle state owned by the queue.

mod options;
mod record;
mod state;

pub use options::{InvalidOptions, ScanOptions};
pub use record::{Job, ScanPayload};
pub use state::JobState;
