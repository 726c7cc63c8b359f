//! Write-through service for note-encoded flags.
//!
//! Every mutation reads the current note from the SaaS, rewrites it with
//! the appropriate codec, pushes it back to the SaaS, and only then updates
//! the mirror store. The SaaS write is fatal on failure (the mirror write
//! is skipped so the two cannot diverge in the dangerous direction); a
//! mirror failure after a successful SaaS write is logged and tolerated,
//! since the next sync pass heals it.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dunner_domain::{Channel, ClientFlags, ClientFlagsPatch, ReminderLevel, Result};
use tracing::{info, warn};

use super::ports::{ClientRepository, InvoiceRepository, InvoicingGateway};
use crate::notes::client_flags::{parse_client_flags, update_client_flags};
use crate::notes::letter_status;
use crate::notes::reminder_ledger::{note_has_third_level_reminder, ReminderLedger};

/// Service for all note-encoded flag mutations
pub struct FlagService {
    gateway: Arc<dyn InvoicingGateway>,
    clients: Arc<dyn ClientRepository>,
    invoices: Arc<dyn InvoiceRepository>,
}

impl FlagService {
    pub fn new(
        gateway: Arc<dyn InvoicingGateway>,
        clients: Arc<dyn ClientRepository>,
        invoices: Arc<dyn InvoiceRepository>,
    ) -> Self {
        Self { gateway, clients, invoices }
    }

    /// Merge a partial flag update into the client note and push it
    /// through. Returns the resulting full flag set.
    pub async fn set_client_flags(
        &self,
        client_id: i64,
        patch: ClientFlagsPatch,
    ) -> Result<ClientFlags> {
        let current = self.gateway.fetch_client(client_id).await?;
        let note = current.note.unwrap_or_default();
        let updated = update_client_flags(&note, patch);

        self.gateway.update_client_note(client_id, &updated).await?;
        if let Err(err) = self.clients.update_client_note(client_id, &updated).await {
            warn!(
                client_id,
                error = %err,
                "mirror client note update failed; next sync will reconcile"
            );
        }

        let flags = parse_client_flags(&updated);
        info!(client_id, ?flags, "client flags updated");
        Ok(flags)
    }

    /// Toggle auto-reminder enrollment for a client.
    pub async fn set_windykacja(&self, client_id: i64, enabled: bool) -> Result<ClientFlags> {
        self.set_client_flags(
            client_id,
            ClientFlagsPatch { windykacja: Some(enabled), ..ClientFlagsPatch::default() },
        )
        .await
    }

    /// Record a sent reminder in the invoice ledger.
    pub async fn record_reminder(
        &self,
        invoice_id: i64,
        channel: Channel,
        level: ReminderLevel,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.rewrite_invoice_note(invoice_id, |note| {
            ReminderLedger::set_flag(note, channel, level, true, at)
        })
        .await
    }

    /// Toggle the manual STOP kill-switch on an invoice.
    pub async fn set_stop(&self, invoice_id: i64, stop: bool, at: DateTime<Utc>) -> Result<()> {
        self.rewrite_invoice_note(invoice_id, |note| ReminderLedger::set_stop(note, stop, at))
            .await
    }

    /// Record that the registered letter for this invoice was posted.
    pub async fn mark_letter_sent(&self, invoice_id: i64, date: NaiveDate) -> Result<()> {
        self.rewrite_invoice_note(invoice_id, |note| letter_status::set_sent(note, date)).await
    }

    /// Exclude the invoice from letter escalation.
    pub async fn ignore_letter(&self, invoice_id: i64) -> Result<()> {
        self.rewrite_invoice_note(invoice_id, letter_status::set_ignored).await
    }

    /// Return the invoice to the awaiting-send bucket (un-ignore).
    pub async fn restore_letter(&self, invoice_id: i64) -> Result<()> {
        self.rewrite_invoice_note(invoice_id, letter_status::set_restored).await
    }

    async fn rewrite_invoice_note<F>(&self, invoice_id: i64, rewrite: F) -> Result<()>
    where
        F: FnOnce(&str) -> String + Send,
    {
        let invoice = self.gateway.fetch_invoice(invoice_id).await?;
        let note = invoice.internal_note.unwrap_or_default();
        let updated = rewrite(&note);

        if updated == note {
            return Ok(());
        }

        self.gateway.update_invoice_note(invoice_id, &updated).await?;

        let has_third = note_has_third_level_reminder(&updated);
        if let Err(err) =
            self.invoices.update_invoice_note(invoice_id, &updated, has_third).await
        {
            warn!(
                invoice_id,
                error = %err,
                "mirror invoice note update failed; next sync will reconcile"
            );
        }

        Ok(())
    }
}
