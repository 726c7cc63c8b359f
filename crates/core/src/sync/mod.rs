//! SaaS-to-store sync orchestration

pub mod service;

pub use service::{DuplicateGroup, SyncReport, SyncService};
