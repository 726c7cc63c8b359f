//! Invoice registered-letter status.
//!
//! One status enum plus one date per invoice, independent of the reminder
//! ledger: letter escalation is tracked per invoice even though
//! qualification is computed per client.
//!
//! Canonical encoding is `[LIST_POLECONY_STATUS]` + `[LIST_POLECONY_DATE]`.
//! Historical notes also carry `[LIST_POLECONY_SENT]` /
//! `[LIST_POLECONY_IGNORED]` date tags from older writers; those are read
//! as a date fallback but never written, and they are stripped whenever the
//! canonical pair is rewritten.

use chrono::NaiveDate;
use dunner_domain::utils::tags::{parse_date_tag, parse_tag, remove_tag, upsert_tag};
use dunner_domain::LetterStatus;

pub const LETTER_STATUS_TAG: &str = "LIST_POLECONY_STATUS";
pub const LETTER_DATE_TAG: &str = "LIST_POLECONY_DATE";
pub const LEGACY_SENT_DATE_TAG: &str = "LIST_POLECONY_SENT";
pub const LEGACY_IGNORED_DATE_TAG: &str = "LIST_POLECONY_IGNORED";

/// Parsed letter state of an invoice note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LetterState {
    pub status: Option<LetterStatus>,
    /// When the status was last meaningfully set; preserved across
    /// `sent -> ignore` so "days since escalation" stays accurate.
    pub date: Option<NaiveDate>,
}

/// Parse the letter state; malformed values read as unset.
pub fn parse_letter_state(note: &str) -> LetterState {
    let status =
        parse_tag(note, LETTER_STATUS_TAG).and_then(|v| LetterStatus::from_tag_value(v.trim()));
    let date = parse_date_tag(note, LETTER_DATE_TAG)
        .or_else(|| parse_date_tag(note, LEGACY_SENT_DATE_TAG))
        .or_else(|| parse_date_tag(note, LEGACY_IGNORED_DATE_TAG));

    LetterState { status, date }
}

/// Record that the registered letter was posted on `date`.
pub fn set_sent(note: &str, date: NaiveDate) -> String {
    write_state(note, LetterStatus::Sent, Some(date))
}

/// Exclude the invoice from letter escalation.
///
/// The existing date (from the canonical tag or a legacy one) is preserved
/// so downstream collections tracking keeps counting from the original
/// escalation date.
pub fn set_ignored(note: &str) -> String {
    let current = parse_letter_state(note);
    write_state(note, LetterStatus::Ignored, current.date)
}

/// Return the invoice to the awaiting-send bucket.
///
/// Restoring is un-ignoring, never un-sending: the status becomes the
/// literal `false` rather than disappearing, and a previously recorded date
/// is kept, so a restored invoice never silently re-enters the "already
/// sent" state.
pub fn set_restored(note: &str) -> String {
    let current = parse_letter_state(note);
    write_state(note, LetterStatus::Restored, current.date)
}

fn write_state(note: &str, status: LetterStatus, date: Option<NaiveDate>) -> String {
    let mut updated = upsert_tag(note, LETTER_STATUS_TAG, status.as_tag_value());

    updated = match date {
        Some(date) => upsert_tag(&updated, LETTER_DATE_TAG, &date.to_string()),
        None => remove_tag(&updated, LETTER_DATE_TAG),
    };

    // the canonical pair replaces any legacy encoding
    updated = remove_tag(&updated, LEGACY_SENT_DATE_TAG);
    remove_tag(&updated, LEGACY_IGNORED_DATE_TAG)
}
