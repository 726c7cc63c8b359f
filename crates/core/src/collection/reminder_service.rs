//! Reminder batch runner.
//!
//! Walks the open invoices of enrolled clients, asks the eligibility engine
//! what is due, sends through the injected [`MessageSender`], and records
//! each send in the invoice ledger. One invoice failing never aborts the
//! batch; outcomes are collected per item. Invoices are processed strictly
//! in sequence, which serializes note writes per invoice - the protocol
//! itself has no optimistic-concurrency token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dunner_domain::{Channel, ClientRecord, DunnerError, InvoiceRecord, ReminderLevel, Result};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::flag_service::FlagService;
use super::ports::{ClientRepository, InvoiceRepository, MessageSender};
use crate::eligibility::needs_reminder;
use crate::notes::client_flags::parse_client_flags;

/// One successfully delivered and recorded reminder
#[derive(Debug, Clone, Serialize)]
pub struct SentReminder {
    pub invoice_id: i64,
    pub client_id: i64,
    pub channel: Channel,
    pub level: ReminderLevel,
}

/// One per-item failure inside a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub invoice_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub error: String,
}

/// Collected result of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub sent: Vec<SentReminder>,
    pub failed: Vec<BatchFailure>,
    /// Open invoices skipped because the client is not enrolled
    pub skipped: usize,
}

impl BatchOutcome {
    fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            sent: Vec::new(),
            failed: Vec::new(),
            skipped: 0,
        }
    }
}

/// Batch driver for automatic reminders
pub struct ReminderService {
    clients: Arc<dyn ClientRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    sender: Arc<dyn MessageSender>,
    flags: Arc<FlagService>,
}

impl ReminderService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        sender: Arc<dyn MessageSender>,
        flags: Arc<FlagService>,
    ) -> Self {
        Self { clients, invoices, sender, flags }
    }

    /// Run one reminder pass over all open invoices.
    pub async fn run_batch(&self, now: DateTime<Utc>) -> Result<BatchOutcome> {
        let open = self.invoices.list_open_invoices().await?;
        let mut outcome = BatchOutcome::new();

        info!(batch_id = %outcome.batch_id, open_invoices = open.len(), "reminder batch starting");

        for invoice in &open {
            if let Err(err) = self.process_invoice(invoice, now, &mut outcome).await {
                error!(invoice_id = invoice.id, error = %err, "invoice processing failed");
                outcome.failed.push(BatchFailure {
                    invoice_id: invoice.id,
                    channel: None,
                    error: err.to_string(),
                });
            }
        }

        info!(
            batch_id = %outcome.batch_id,
            sent = outcome.sent.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped,
            "reminder batch finished"
        );
        Ok(outcome)
    }

    async fn process_invoice(
        &self,
        invoice: &InvoiceRecord,
        now: DateTime<Utc>,
        outcome: &mut BatchOutcome,
    ) -> Result<()> {
        let client = self
            .clients
            .get_client(invoice.client_id)
            .await?
            .ok_or_else(|| {
                DunnerError::NotFound(format!("client {} for invoice {}", invoice.client_id, invoice.id))
            })?;

        if !parse_client_flags(&client.note).windykacja {
            outcome.skipped += 1;
            return Ok(());
        }

        for channel in Channel::ALL {
            for level in ReminderLevel::ALL {
                if !needs_reminder(invoice, channel, level, now) {
                    continue;
                }

                match self.send_and_record(&client, invoice, channel, level, now).await {
                    Ok(()) => outcome.sent.push(SentReminder {
                        invoice_id: invoice.id,
                        client_id: client.id,
                        channel,
                        level,
                    }),
                    Err(err) => {
                        error!(
                            invoice_id = invoice.id,
                            channel = %channel,
                            level = %level,
                            error = %err,
                            "reminder send failed"
                        );
                        outcome.failed.push(BatchFailure {
                            invoice_id: invoice.id,
                            channel: Some(channel),
                            error: err.to_string(),
                        });
                    }
                }

                // at most one level per channel per run
                break;
            }
        }

        Ok(())
    }

    /// Send one specific reminder on operator request.
    ///
    /// Unlike the batch, this does not consult the eligibility engine: an
    /// operator explicitly asking for a send overrides the schedule. The
    /// ledger write still happens, so the automatic runs see it.
    pub async fn send_single(
        &self,
        invoice_id: i64,
        channel: Channel,
        level: ReminderLevel,
        now: DateTime<Utc>,
    ) -> Result<SentReminder> {
        let invoice = self
            .invoices
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| DunnerError::NotFound(format!("invoice {invoice_id}")))?;
        let client = self
            .clients
            .get_client(invoice.client_id)
            .await?
            .ok_or_else(|| DunnerError::NotFound(format!("client {}", invoice.client_id)))?;

        self.send_and_record(&client, &invoice, channel, level, now).await?;
        info!(invoice_id, channel = %channel, level = %level, "manual reminder sent");

        Ok(SentReminder { invoice_id, client_id: client.id, channel, level })
    }

    async fn send_and_record(
        &self,
        client: &ClientRecord,
        invoice: &InvoiceRecord,
        channel: Channel,
        level: ReminderLevel,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.sender.send_reminder(client, invoice, channel, level).await?;
        // a ledger write failure here leaves the message sent but
        // unrecorded; surfaced as a batch failure so an operator can check
        // before the next run
        self.flags.record_reminder(invoice.id, channel, level, now).await
    }
}
