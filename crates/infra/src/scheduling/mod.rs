//! Scheduling infrastructure for automated background work
//!
//! Cron-based scheduling for the two periodic jobs of the back office: the
//! full SaaS-to-store sync and the reminder batch. Lifecycle rules: explicit
//! start/stop, tracked join state, cancellation tokens, and timeouts around
//! every job execution.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{SyncScheduler, SyncSchedulerConfig};
