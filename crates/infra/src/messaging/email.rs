//! E-mail reminder delivery.
//!
//! The invoicing SaaS already knows how to e-mail its own documents, so the
//! e-mail channel simply triggers that delivery again. This also means an
//! e-mail reminder always carries the current invoice PDF.

use std::sync::Arc;

use dunner_domain::{ClientRecord, DunnerError, InvoiceRecord, Result};
use tracing::debug;

use crate::integrations::fakturownia::FakturowniaClient;

/// E-mail channel provider backed by the SaaS document delivery
pub struct FakturowniaEmailSender {
    client: Arc<FakturowniaClient>,
}

impl FakturowniaEmailSender {
    pub fn new(client: Arc<FakturowniaClient>) -> Self {
        Self { client }
    }

    pub async fn send(&self, client: &ClientRecord, invoice: &InvoiceRecord) -> Result<()> {
        if client.email.as_deref().unwrap_or_default().is_empty() {
            return Err(DunnerError::Provider(format!(
                "client {} has no e-mail address",
                client.id
            )));
        }

        debug!(invoice_id = invoice.id, client_id = client.id, "sending e-mail reminder");
        self.client.send_invoice_by_email(invoice.id).await
    }
}
