//! Port interfaces for collection operations

use async_trait::async_trait;
use dunner_domain::types::fakturownia::{FakturowniaClient, FakturowniaInvoice};
use dunner_domain::{Channel, ClientRecord, InvoiceRecord, ReminderLevel, Result};

/// The invoicing SaaS: system of record for clients, invoices, and their
/// note fields. Notes must round-trip unmodified; the tag syntax inside
/// them is load-bearing.
#[async_trait]
pub trait InvoicingGateway: Send + Sync {
    /// Fetch a single client by id
    async fn fetch_client(&self, client_id: i64) -> Result<FakturowniaClient>;

    /// Fetch a single invoice by id
    async fn fetch_invoice(&self, invoice_id: i64) -> Result<FakturowniaInvoice>;

    /// List one page of clients
    async fn list_clients(&self, page: usize, per_page: usize) -> Result<Vec<FakturowniaClient>>;

    /// List one page of invoices
    async fn list_invoices(&self, page: usize, per_page: usize)
        -> Result<Vec<FakturowniaInvoice>>;

    /// Replace a client's note field
    async fn update_client_note(&self, client_id: i64, note: &str) -> Result<()>;

    /// Replace an invoice's internal note field
    async fn update_invoice_note(&self, invoice_id: i64, note: &str) -> Result<()>;
}

/// Mirror-store access for client rows
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert or update a batch of client rows
    async fn upsert_clients(&self, clients: &[ClientRecord]) -> Result<()>;

    /// Get a client row by id
    async fn get_client(&self, id: i64) -> Result<Option<ClientRecord>>;

    /// List all client rows
    async fn list_clients(&self) -> Result<Vec<ClientRecord>>;

    /// Update just the note column of a client row
    async fn update_client_note(&self, id: i64, note: &str) -> Result<()>;
}

/// Mirror-store access for invoice rows
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Insert or update a batch of invoice rows
    async fn upsert_invoices(&self, invoices: &[InvoiceRecord]) -> Result<()>;

    /// Get an invoice row by id
    async fn get_invoice(&self, id: i64) -> Result<Option<InvoiceRecord>>;

    /// List unpaid, non-canceled invoices with a positive outstanding amount
    async fn list_open_invoices(&self) -> Result<Vec<InvoiceRecord>>;

    /// List all invoices of one client
    async fn list_invoices_for_client(&self, client_id: i64) -> Result<Vec<InvoiceRecord>>;

    /// List invoices whose materialized third-reminder column is set
    async fn list_third_reminder_invoices(&self) -> Result<Vec<InvoiceRecord>>;

    /// Update the note column and the materialized third-reminder cache of
    /// an invoice row
    async fn update_invoice_note(
        &self,
        id: i64,
        note: &str,
        has_third_reminder: bool,
    ) -> Result<()>;
}

/// Outbound reminder delivery on one channel
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver a level-N reminder for the invoice to the client
    async fn send_reminder(
        &self,
        client: &ClientRecord,
        invoice: &InvoiceRecord,
        channel: Channel,
        level: ReminderLevel,
    ) -> Result<()>;
}
