//! # Dunner Core
//!
//! Business logic for the dunner back office: the note codecs that read and
//! write protocol state embedded in free-text note fields, the pure
//! reminder-eligibility engine, and the services that drive flag updates,
//! reminder batches, escalation queries, and SaaS-to-store sync.
//!
//! ## Architecture
//! - Pure logic operates on values; no I/O crates
//! - All side effects go through the port traits in [`collection::ports`]
//! - Adapters are injected as `Arc<dyn Port>` by the composition root

pub mod collection;
pub mod eligibility;
pub mod notes;
pub mod sync;

pub use collection::ports::{ClientRepository, InvoiceRepository, InvoicingGateway, MessageSender};
pub use collection::{BatchOutcome, EscalationService, FlagService, ReminderService};
pub use notes::client_flags::{parse_client_flags, update_client_flags};
pub use notes::letter_status::{parse_letter_state, LetterState};
pub use notes::reminder_ledger::{note_has_third_level_reminder, ReminderLedger};
pub use sync::{SyncReport, SyncService};
