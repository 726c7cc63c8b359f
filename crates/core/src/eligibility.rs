//! Reminder-eligibility engine.
//!
//! Pure decision functions over invoice records and their parsed note
//! state; no I/O, no clock access. Callers pass the evaluation date in and
//! perform the actual sends; these functions only report readiness.
//!
//! Per (invoice, channel) the ledger forms a small state machine
//! (none-sent, level1..3-sent, stopped). Transitions only happen through
//! explicit send actions recorded by the caller; nothing here mutates.

use chrono::{DateTime, NaiveDate, Utc};
use dunner_domain::constants::{
    LETTER_DEBT_THRESHOLD, LETTER_MIN_QUALIFYING_INVOICES, REMINDER_INTERVAL_DAYS,
};
use dunner_domain::{Channel, ClientFlags, InvoiceRecord, LetterStatus, ReminderLevel};

use crate::notes::letter_status::parse_letter_state;
use crate::notes::reminder_ledger::ReminderLedger;

/// Should a level/channel reminder go out for this invoice now?
///
/// Level 1 is ready as soon as the invoice is actionable; level N>1 only
/// when level N-1 was sent at least [`REMINDER_INTERVAL_DAYS`] ago. The
/// ledger does not hard-enforce level order; this elapsed-time rule is the
/// only gate between levels.
pub fn needs_reminder(
    invoice: &InvoiceRecord,
    channel: Channel,
    level: ReminderLevel,
    now: DateTime<Utc>,
) -> bool {
    if invoice.is_paid() || invoice.is_canceled() || invoice.outstanding() <= 0.0 {
        return false;
    }

    let ledger = ReminderLedger::parse(&invoice.internal_note).unwrap_or_default();
    if ledger.stop {
        return false;
    }
    if ledger.entry(channel, level).sent {
        return false;
    }

    match level.previous() {
        None => true,
        Some(previous) => {
            let entry = ledger.entry(channel, previous);
            if !entry.sent {
                return false;
            }
            match entry.sent_at {
                Some(sent_at) => {
                    (now.date_naive() - sent_at.date_naive()).num_days()
                        >= REMINDER_INTERVAL_DAYS
                }
                // sent without a timestamp (hand-edited): no basis for the
                // elapsed-time rule, hold off
                None => false,
            }
        }
    }
}

/// Does this invoice feed the registered-letter pipeline?
///
/// True when some channel reached level 3 and the letter was neither sent
/// nor explicitly ignored. Recomputed from the note; the materialized
/// `has_third_reminder` column is a query cache, not the source of truth.
pub fn qualifies_for_third_reminder_escalation(invoice: &InvoiceRecord) -> bool {
    let ledger = ReminderLedger::parse(&invoice.internal_note).unwrap_or_default();
    if !ledger.has_third_level_reminder() {
        return false;
    }

    !matches!(
        parse_letter_state(&invoice.internal_note).status,
        Some(LetterStatus::Sent) | Some(LetterStatus::Ignored)
    )
}

/// Does this client qualify for registered-letter escalation?
///
/// Among the client's invoices passing
/// [`qualifies_for_third_reminder_escalation`], either enough of them piled
/// up or the qualifying debt crossed the threshold; each path is sufficient
/// on its own. Clients already escalated or explicitly excluded never
/// qualify.
pub fn qualifies_for_letter_escalation(
    flags: &ClientFlags,
    client_invoices: &[InvoiceRecord],
) -> bool {
    if flags.list_polecony || flags.list_polecony_ignored {
        return false;
    }

    let qualifying: Vec<&InvoiceRecord> = client_invoices
        .iter()
        .filter(|invoice| qualifies_for_third_reminder_escalation(invoice))
        .collect();

    if qualifying.len() >= LETTER_MIN_QUALIFYING_INVOICES {
        return true;
    }

    let debt: f64 = qualifying
        .iter()
        .filter(|invoice| !invoice.is_corrective())
        .map(|invoice| invoice.outstanding())
        .sum();
    debt >= LETTER_DEBT_THRESHOLD
}

/// Is this invoice ready for handoff to the collections agency?
///
/// The registered letter must have gone out at least `min_days` ago
/// (callers pass `COLLECTIONS_MIN_DAYS`) and the invoice must still be
/// unpaid.
pub fn qualifies_for_collections_handoff(
    invoice: &InvoiceRecord,
    now: NaiveDate,
    min_days: i64,
) -> bool {
    if invoice.is_paid() {
        return false;
    }

    let state = parse_letter_state(&invoice.internal_note);
    if state.status != Some(LetterStatus::Sent) {
        return false;
    }

    state.date.is_some_and(|sent_on| (now - sent_on).num_days() >= min_days)
}

/// Client-level debt total: the outstanding sum over the given invoices,
/// with corrective/credit notes excluded regardless of their raw financial
/// fields.
pub fn collectible_outstanding(invoices: &[InvoiceRecord]) -> f64 {
    invoices
        .iter()
        .filter(|invoice| !invoice.is_corrective())
        .map(|invoice| invoice.outstanding())
        .sum()
}
