//! Collection workflow services.
//!
//! Everything that mutates protocol state or drives messaging goes through
//! here: flag write-through ([`FlagService`]), the reminder batch runner
//! ([`ReminderService`]), and the read-only escalation queries
//! ([`EscalationService`]). All I/O is behind the port traits in [`ports`].

pub mod escalation_service;
pub mod flag_service;
pub mod ports;
pub mod reminder_service;

pub use escalation_service::{Debtor, EscalationService, LetterCandidate};
pub use flag_service::FlagService;
pub use reminder_service::{BatchFailure, BatchOutcome, ReminderService, SentReminder};
