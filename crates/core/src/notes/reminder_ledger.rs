//! Invoice reminder ledger.
//!
//! A `[FISCAL_SYNC]` block inside the invoice note records, per channel and
//! escalation level, whether a reminder went out and when, plus the manual
//! STOP kill-switch, a content-integrity hash, and a last-updated timestamp.
//!
//! Block syntax (newline-separated `KEY=VALUE` pairs):
//!
//! ```text
//! [FISCAL_SYNC]
//! EMAIL_1=TRUE
//! EMAIL_1_DATE=2025-01-01T08:30:00Z
//! SMS_1=FALSE
//! STOP=FALSE
//! HASH=3fb8a1...
//! UPDATED=2025-01-01T08:30:00Z
//! [/FISCAL_SYNC]
//! ```
//!
//! Blocks are hand-editable; every field is individually defaultable and
//! unknown keys are ignored. Writers always rewrite the whole block so a
//! boolean and its timestamp can never go out of step.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use dunner_domain::utils::tags::{parse_date_value, parse_tag, upsert_tag};
use dunner_domain::{Channel, ReminderLevel};
use sha2::{Digest, Sha256};

pub const FISCAL_SYNC_TAG: &str = "FISCAL_SYNC";

/// One channel/level cell of the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Parsed `[FISCAL_SYNC]` block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderLedger {
    entries: [LedgerEntry; 9],
    /// Manual kill-switch; suppresses all future automatic sends
    pub stop: bool,
    /// Content-integrity hash used by the duplicate detector
    pub hash: Option<String>,
    /// When the block was last rewritten
    pub updated: Option<DateTime<Utc>>,
}

impl ReminderLedger {
    /// Parse the ledger out of an invoice note. `None` when the block tag
    /// is entirely absent; a present-but-empty block parses to defaults.
    pub fn parse(note: &str) -> Option<Self> {
        let block = parse_tag(note, FISCAL_SYNC_TAG)?;
        Some(Self::from_block(&block))
    }

    fn from_block(block: &str) -> Self {
        let mut ledger = Self::default();

        for line in block.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "STOP" => ledger.stop = is_true(value),
                "HASH" => {
                    if !value.is_empty() {
                        ledger.hash = Some(value.to_string());
                    }
                }
                "UPDATED" => ledger.updated = parse_block_timestamp(value),
                _ => {
                    let Some((channel, level, is_date)) = parse_entry_key(key) else {
                        continue;
                    };
                    let entry = ledger.entry_mut(channel, level);
                    if is_date {
                        entry.sent_at = parse_block_timestamp(value);
                    } else {
                        entry.sent = is_true(value);
                    }
                }
            }
        }

        ledger
    }

    /// Render the full block body, deterministically ordered.
    fn render_block(&self) -> String {
        let mut lines = Vec::with_capacity(16);

        for channel in Channel::ALL {
            for level in ReminderLevel::ALL {
                let entry = self.entry(channel, level);
                let key = entry_key(channel, level);
                lines.push(format!("{key}={}", render_bool(entry.sent)));
                if entry.sent {
                    if let Some(sent_at) = entry.sent_at {
                        lines.push(format!("{key}_DATE={}", render_timestamp(sent_at)));
                    }
                }
            }
        }

        lines.push(format!("STOP={}", render_bool(self.stop)));
        if let Some(hash) = &self.hash {
            lines.push(format!("HASH={hash}"));
        }
        if let Some(updated) = self.updated {
            lines.push(format!("UPDATED={}", render_timestamp(updated)));
        }

        lines.join("\n")
    }

    /// Write the ledger back into the note, replacing an existing block in
    /// place or appending a new one.
    pub fn apply(&self, note: &str) -> String {
        let body = format!("\n{}\n", self.render_block());
        upsert_tag(note, FISCAL_SYNC_TAG, &body)
    }

    pub fn entry(&self, channel: Channel, level: ReminderLevel) -> LedgerEntry {
        self.entries[entry_index(channel, level)]
    }

    fn entry_mut(&mut self, channel: Channel, level: ReminderLevel) -> &mut LedgerEntry {
        &mut self.entries[entry_index(channel, level)]
    }

    /// True when any channel recorded a third-level send.
    ///
    /// Deliberately independent of invoice status: a paid invoice can still
    /// "have had" a third reminder; payment/cancellation exclusions are the
    /// caller's business.
    pub fn has_third_level_reminder(&self) -> bool {
        Channel::ALL
            .iter()
            .any(|channel| self.entry(*channel, ReminderLevel::Third).sent)
    }

    /// Set one channel/level cell and rewrite the whole block. Initializes
    /// a fresh block when the note had none.
    pub fn set_flag(
        note: &str,
        channel: Channel,
        level: ReminderLevel,
        sent: bool,
        at: DateTime<Utc>,
    ) -> String {
        let mut ledger = Self::parse(note).unwrap_or_default();
        *ledger.entry_mut(channel, level) =
            LedgerEntry { sent, sent_at: sent.then_some(at) };
        ledger.updated = Some(at);
        ledger.apply(note)
    }

    /// Toggle the manual STOP kill-switch.
    pub fn set_stop(note: &str, stop: bool, at: DateTime<Utc>) -> String {
        let mut ledger = Self::parse(note).unwrap_or_default();
        ledger.stop = stop;
        ledger.updated = Some(at);
        ledger.apply(note)
    }

    /// One-way reconciliation with the SaaS's own e-mail delivery.
    ///
    /// When the invoicing tool already emailed the document at creation
    /// time, synthesize an EMAIL level-1 entry dated at the external send
    /// time so the first reminder is not duplicated. Returns `None` (no
    /// change) once EMAIL level-1 is already recorded, which makes repeated
    /// reconciliation idempotent.
    pub fn reconcile_external_send(
        note: &str,
        external_sent_at: Option<DateTime<Utc>>,
        fingerprint: &str,
    ) -> Option<String> {
        let sent_at = external_sent_at?;
        let mut ledger = Self::parse(note).unwrap_or_default();

        if ledger.entry(Channel::Email, ReminderLevel::First).sent {
            return None;
        }

        *ledger.entry_mut(Channel::Email, ReminderLevel::First) =
            LedgerEntry { sent: true, sent_at: Some(sent_at) };
        if ledger.hash.is_none() {
            ledger.hash = Some(fingerprint.to_string());
        }
        ledger.updated = Some(sent_at);
        Some(ledger.apply(note))
    }
}

/// Third-level predicate straight off a note; absent ledger reads as false.
pub fn note_has_third_level_reminder(note: &str) -> bool {
    ReminderLedger::parse(note).is_some_and(|ledger| ledger.has_third_level_reminder())
}

/// Content-integrity fingerprint for duplicate detection: same client, same
/// issue date, same gross total.
pub fn invoice_fingerprint(client_id: i64, issue_date: Option<NaiveDate>, total: f64) -> String {
    let date = issue_date.map(|d| d.to_string()).unwrap_or_default();
    let digest = Sha256::digest(format!("{client_id}|{date}|{total:.2}").as_bytes());
    hex::encode(digest)
}

fn entry_index(channel: Channel, level: ReminderLevel) -> usize {
    let channel_index = match channel {
        Channel::Email => 0,
        Channel::Sms => 1,
        Channel::Whatsapp => 2,
    };
    channel_index * 3 + (level.number() as usize - 1)
}

fn entry_key(channel: Channel, level: ReminderLevel) -> String {
    format!("{}_{}", channel.ledger_prefix(), level.number())
}

fn parse_entry_key(key: &str) -> Option<(Channel, ReminderLevel, bool)> {
    let (base, is_date) = match key.strip_suffix("_DATE") {
        Some(base) => (base, true),
        None => (key, false),
    };

    let (prefix, level) = base.rsplit_once('_')?;
    let channel = match prefix {
        "EMAIL" => Channel::Email,
        "SMS" => Channel::Sms,
        "WHATSAPP" => Channel::Whatsapp,
        _ => return None,
    };
    let level = ReminderLevel::from_number(level.parse().ok()?)?;

    Some((channel, level, is_date))
}

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn render_bool(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn render_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_block_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    // tolerate hand-edited date-only values
    parse_date_value(value).and_then(|date| date.and_hms_opt(0, 0, 0)).map(|ts| ts.and_utc())
}
