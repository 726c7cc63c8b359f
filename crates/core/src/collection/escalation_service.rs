//! Escalation queries.
//!
//! Read-only views over the mirror store: which clients are due a
//! registered letter, which invoices are ripe for collections handoff, and
//! the overall debtor list. Nothing here mutates; letter/ignore decisions
//! are taken by an operator and recorded through the flag service.

use std::sync::Arc;

use chrono::NaiveDate;
use dunner_domain::{ClientFlags, ClientRecord, InvoiceRecord, Result};
use serde::Serialize;

use super::ports::{ClientRepository, InvoiceRepository};
use crate::eligibility::{
    collectible_outstanding, qualifies_for_collections_handoff, qualifies_for_letter_escalation,
    qualifies_for_third_reminder_escalation,
};
use crate::notes::client_flags::parse_client_flags;

/// A client due for registered-letter escalation
#[derive(Debug, Clone, Serialize)]
pub struct LetterCandidate {
    pub client: ClientRecord,
    pub flags: ClientFlags,
    /// The third-reminder invoices that produced the qualification
    pub qualifying_invoices: Vec<InvoiceRecord>,
    /// Qualifying debt, corrective invoices excluded
    pub outstanding: f64,
}

/// One row of the debtor overview
#[derive(Debug, Clone, Serialize)]
pub struct Debtor {
    pub client: ClientRecord,
    pub open_invoices: usize,
    pub outstanding: f64,
}

/// Read-only escalation queries over the mirror store
pub struct EscalationService {
    clients: Arc<dyn ClientRepository>,
    invoices: Arc<dyn InvoiceRepository>,
}

impl EscalationService {
    pub fn new(clients: Arc<dyn ClientRepository>, invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { clients, invoices }
    }

    /// Clients currently qualifying for registered-letter escalation.
    pub async fn letter_candidates(&self) -> Result<Vec<LetterCandidate>> {
        let clients = self.clients.list_clients().await?;
        let mut candidates = Vec::new();

        for client in clients {
            let flags = parse_client_flags(&client.note);
            if flags.list_polecony || flags.list_polecony_ignored {
                continue;
            }

            let invoices = self.invoices.list_invoices_for_client(client.id).await?;
            if !qualifies_for_letter_escalation(&flags, &invoices) {
                continue;
            }

            let qualifying: Vec<InvoiceRecord> = invoices
                .into_iter()
                .filter(qualifies_for_third_reminder_escalation)
                .collect();
            let outstanding = collectible_outstanding(&qualifying);

            candidates.push(LetterCandidate { client, flags, qualifying_invoices: qualifying, outstanding });
        }

        Ok(candidates)
    }

    /// Invoices ready for the collections-agency intake list.
    ///
    /// Narrows by the materialized third-reminder column first, then
    /// re-evaluates from the note, so a stale cache row can only cost a
    /// recomputation, never a wrong handoff.
    pub async fn collections_candidates(
        &self,
        now: NaiveDate,
        min_days: i64,
    ) -> Result<Vec<InvoiceRecord>> {
        let third = self.invoices.list_third_reminder_invoices().await?;
        Ok(third
            .into_iter()
            .filter(|invoice| qualifies_for_collections_handoff(invoice, now, min_days))
            .collect())
    }

    /// All clients with open collectible debt.
    pub async fn debtors(&self) -> Result<Vec<Debtor>> {
        let clients = self.clients.list_clients().await?;
        let mut debtors = Vec::new();

        for client in clients {
            let invoices = self.invoices.list_invoices_for_client(client.id).await?;
            let open: Vec<InvoiceRecord> = invoices
                .into_iter()
                .filter(|invoice| {
                    !invoice.is_paid() && !invoice.is_canceled() && invoice.outstanding() > 0.0
                })
                .collect();

            let outstanding = collectible_outstanding(&open);
            if outstanding > 0.0 {
                debtors.push(Debtor { client, open_invoices: open.len(), outstanding });
            }
        }

        Ok(debtors)
    }
}
