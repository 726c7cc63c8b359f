//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Reminder escalation
pub const REMINDER_INTERVAL_DAYS: i64 = 7;

// Registered-letter escalation: a client qualifies with at least this many
// third-reminder invoices, or with the qualifying outstanding sum at or
// above the debt threshold (either condition alone is sufficient).
pub const LETTER_MIN_QUALIFYING_INVOICES: usize = 3;
pub const LETTER_DEBT_THRESHOLD: f64 = 190.0;

// Collections handoff waits this many days after the registered letter
pub const COLLECTIONS_MIN_DAYS: i64 = 31;

// Corrective/credit-note invoices carry this number prefix and are excluded
// from all outstanding-balance aggregation.
pub const CORRECTIVE_INVOICE_PREFIX: &str = "FK";

// Invoice status/kind literals as served by the invoicing SaaS
pub const INVOICE_STATUS_PAID: &str = "paid";
pub const INVOICE_KIND_CANCELED: &str = "canceled";

// Sync configuration
pub const DEFAULT_SYNC_PAGE_SIZE: usize = 100;
pub const DEFAULT_SAAS_WRITE_DELAY_MS: u64 = 250;
