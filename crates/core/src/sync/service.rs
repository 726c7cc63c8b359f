//! Sync service: mirror the invoicing SaaS into the local store.
//!
//! Pages through clients and invoices, adapts the loose SaaS rows into
//! typed records, reconciles the SaaS's own e-mail deliveries into the
//! reminder ledger, refreshes the materialized third-reminder column, and
//! upserts everything. A best-effort duplicate detector groups invoices by
//! content fingerprint along the way.
//!
//! Per-item and per-page failures are collected into the report; one bad
//! row never aborts the pass.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dunner_domain::{ClientRecord, InvoiceRecord, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::collection::ports::{ClientRepository, InvoiceRepository, InvoicingGateway};
use crate::notes::reminder_ledger::{
    invoice_fingerprint, note_has_third_level_reminder, ReminderLedger,
};

/// Invoices sharing one content fingerprint
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub fingerprint: String,
    pub invoice_ids: Vec<i64>,
}

/// Result of one sync pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub clients_synced: usize,
    pub invoices_synced: usize,
    /// Rows without a client reference (drafts, templates)
    pub invoices_skipped: usize,
    /// EMAIL level-1 entries synthesized from the SaaS's own deliveries
    pub emails_reconciled: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub errors: Vec<String>,
}

/// Orchestrates the SaaS-to-mirror sync
pub struct SyncService {
    gateway: Arc<dyn InvoicingGateway>,
    clients: Arc<dyn ClientRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    page_size: usize,
}

impl SyncService {
    pub fn new(
        gateway: Arc<dyn InvoicingGateway>,
        clients: Arc<dyn ClientRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        page_size: usize,
    ) -> Self {
        Self { gateway, clients, invoices, page_size: page_size.max(1) }
    }

    /// Run one full sync pass.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        self.sync_clients(now, &mut report).await;
        self.sync_invoices(now, &mut report).await;

        info!(
            clients = report.clients_synced,
            invoices = report.invoices_synced,
            skipped = report.invoices_skipped,
            reconciled = report.emails_reconciled,
            duplicate_groups = report.duplicates.len(),
            errors = report.errors.len(),
            "sync pass finished"
        );
        Ok(report)
    }

    async fn sync_clients(&self, now: DateTime<Utc>, report: &mut SyncReport) {
        let mut page = 1;
        loop {
            let batch = match self.gateway.list_clients(page, self.page_size).await {
                Ok(batch) => batch,
                Err(err) => {
                    warn!(page, error = %err, "client page fetch failed");
                    report.errors.push(format!("clients page {page}: {err}"));
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }

            let fetched = batch.len();
            let records: Vec<ClientRecord> =
                batch.into_iter().map(|dto| dto.into_record(now)).collect();

            match self.clients.upsert_clients(&records).await {
                Ok(()) => report.clients_synced += records.len(),
                Err(err) => {
                    warn!(page, error = %err, "client page upsert failed");
                    report.errors.push(format!("clients page {page} upsert: {err}"));
                }
            }

            if fetched < self.page_size {
                break;
            }
            page += 1;
        }
    }

    async fn sync_invoices(&self, now: DateTime<Utc>, report: &mut SyncReport) {
        let mut fingerprints: HashMap<String, Vec<i64>> = HashMap::new();
        let mut page = 1;

        loop {
            let batch = match self.gateway.list_invoices(page, self.page_size).await {
                Ok(batch) => batch,
                Err(err) => {
                    warn!(page, error = %err, "invoice page fetch failed");
                    report.errors.push(format!("invoices page {page}: {err}"));
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }

            let fetched = batch.len();
            let mut records = Vec::with_capacity(fetched);

            for dto in batch {
                let external_sent_at = dto.sent_time;
                let Some(mut record) = dto.into_record(now) else {
                    report.invoices_skipped += 1;
                    continue;
                };

                let fingerprint =
                    invoice_fingerprint(record.client_id, record.issue_date, record.total);

                self.reconcile_external_send(&mut record, external_sent_at, &fingerprint, report)
                    .await;

                record.has_third_reminder = note_has_third_level_reminder(&record.internal_note);

                if !record.is_canceled() && !record.is_corrective() {
                    fingerprints.entry(fingerprint).or_default().push(record.id);
                }
                records.push(record);
            }

            match self.invoices.upsert_invoices(&records).await {
                Ok(()) => report.invoices_synced += records.len(),
                Err(err) => {
                    warn!(page, error = %err, "invoice page upsert failed");
                    report.errors.push(format!("invoices page {page} upsert: {err}"));
                }
            }

            if fetched < self.page_size {
                break;
            }
            page += 1;
        }

        let mut duplicates: Vec<DuplicateGroup> = fingerprints
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(fingerprint, mut invoice_ids)| {
                invoice_ids.sort_unstable();
                DuplicateGroup { fingerprint, invoice_ids }
            })
            .collect();
        duplicates.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        report.duplicates = duplicates;
    }

    /// Fold the SaaS's own e-mail delivery into the ledger.
    ///
    /// The updated note goes back to the SaaS first; only then does the
    /// in-memory record (and with it the mirror upsert) pick it up. When
    /// the SaaS write fails the original note is kept so mirror and SaaS
    /// stay consistent with each other.
    async fn reconcile_external_send(
        &self,
        record: &mut InvoiceRecord,
        external_sent_at: Option<DateTime<Utc>>,
        fingerprint: &str,
        report: &mut SyncReport,
    ) {
        let Some(updated_note) = ReminderLedger::reconcile_external_send(
            &record.internal_note,
            external_sent_at,
            fingerprint,
        ) else {
            return;
        };

        match self.gateway.update_invoice_note(record.id, &updated_note).await {
            Ok(()) => {
                record.internal_note = updated_note;
                report.emails_reconciled += 1;
            }
            Err(err) => {
                warn!(invoice_id = record.id, error = %err, "external-send reconciliation write failed");
                report
                    .errors
                    .push(format!("invoice {} reconciliation: {err}", record.id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use dunner_domain::types::fakturownia::{FakturowniaClient, FakturowniaInvoice};
    use dunner_domain::{Channel, DunnerError, ReminderLevel};

    use super::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid timestamp").with_timezone(&Utc)
    }

    struct StubBackend {
        client_pages: Vec<Vec<FakturowniaClient>>,
        invoice_pages: Vec<Vec<FakturowniaInvoice>>,
        upserted_clients: Mutex<Vec<ClientRecord>>,
        upserted_invoices: Mutex<Vec<InvoiceRecord>>,
        note_writes: Mutex<Vec<(i64, String)>>,
        fail_note_writes: bool,
    }

    impl StubBackend {
        fn new(
            client_pages: Vec<Vec<FakturowniaClient>>,
            invoice_pages: Vec<Vec<FakturowniaInvoice>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                client_pages,
                invoice_pages,
                upserted_clients: Mutex::new(Vec::new()),
                upserted_invoices: Mutex::new(Vec::new()),
                note_writes: Mutex::new(Vec::new()),
                fail_note_writes: false,
            })
        }
    }

    #[async_trait]
    impl InvoicingGateway for StubBackend {
        async fn fetch_client(&self, _client_id: i64) -> Result<FakturowniaClient> {
            Err(DunnerError::NotFound("not used".into()))
        }

        async fn fetch_invoice(&self, _invoice_id: i64) -> Result<FakturowniaInvoice> {
            Err(DunnerError::NotFound("not used".into()))
        }

        async fn list_clients(&self, page: usize, _: usize) -> Result<Vec<FakturowniaClient>> {
            Ok(self.client_pages.get(page - 1).cloned().unwrap_or_default())
        }

        async fn list_invoices(&self, page: usize, _: usize) -> Result<Vec<FakturowniaInvoice>> {
            Ok(self.invoice_pages.get(page - 1).cloned().unwrap_or_default())
        }

        async fn update_client_note(&self, _client_id: i64, _note: &str) -> Result<()> {
            Ok(())
        }

        async fn update_invoice_note(&self, invoice_id: i64, note: &str) -> Result<()> {
            if self.fail_note_writes {
                return Err(DunnerError::Network("saas down".into()));
            }
            self.note_writes.lock().unwrap().push((invoice_id, note.to_string()));
            Ok(())
        }
    }

    #[async_trait]
    impl ClientRepository for StubBackend {
        async fn upsert_clients(&self, clients: &[ClientRecord]) -> Result<()> {
            self.upserted_clients.lock().unwrap().extend_from_slice(clients);
            Ok(())
        }

        async fn get_client(&self, _id: i64) -> Result<Option<ClientRecord>> {
            Ok(None)
        }

        async fn list_clients(&self) -> Result<Vec<ClientRecord>> {
            Ok(vec![])
        }

        async fn update_client_note(&self, _id: i64, _note: &str) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl InvoiceRepository for StubBackend {
        async fn upsert_invoices(&self, invoices: &[InvoiceRecord]) -> Result<()> {
            self.upserted_invoices.lock().unwrap().extend_from_slice(invoices);
            Ok(())
        }

        async fn get_invoice(&self, _id: i64) -> Result<Option<InvoiceRecord>> {
            Ok(None)
        }

        async fn list_open_invoices(&self) -> Result<Vec<InvoiceRecord>> {
            Ok(vec![])
        }

        async fn list_invoices_for_client(&self, _client_id: i64) -> Result<Vec<InvoiceRecord>> {
            Ok(vec![])
        }

        async fn list_third_reminder_invoices(&self) -> Result<Vec<InvoiceRecord>> {
            Ok(vec![])
        }

        async fn update_invoice_note(
            &self,
            _id: i64,
            _note: &str,
            _has_third_reminder: bool,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn saas_client(id: i64) -> FakturowniaClient {
        FakturowniaClient {
            id,
            name: Some(format!("Client {id}")),
            ..FakturowniaClient::default()
        }
    }

    fn saas_invoice(id: i64, client_id: i64) -> FakturowniaInvoice {
        FakturowniaInvoice {
            id,
            client_id: Some(client_id),
            number: Some(format!("2025/01/{id:04}")),
            price_gross: 100.0,
            status: Some("issued".to_string()),
            kind: Some("vat".to_string()),
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            ..FakturowniaInvoice::default()
        }
    }

    fn sync(backend: &Arc<StubBackend>, page_size: usize) -> SyncService {
        SyncService::new(backend.clone(), backend.clone(), backend.clone(), page_size)
    }

    #[tokio::test]
    async fn pages_until_a_short_page() {
        let backend = StubBackend::new(
            vec![
                vec![saas_client(1), saas_client(2)],
                vec![saas_client(3)],
            ],
            vec![vec![saas_invoice(10, 1)]],
        );

        let report =
            sync(&backend, 2).run(at("2025-02-01T03:00:00Z")).await.expect("sync runs");

        assert_eq!(report.clients_synced, 3);
        assert_eq!(report.invoices_synced, 1);
        assert!(report.errors.is_empty());
        assert_eq!(backend.upserted_clients.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rows_without_client_reference_are_skipped() {
        let mut orphan = saas_invoice(11, 1);
        orphan.client_id = None;

        let backend = StubBackend::new(
            vec![],
            vec![vec![saas_invoice(10, 1), orphan]],
        );

        let report =
            sync(&backend, 50).run(at("2025-02-01T03:00:00Z")).await.expect("sync runs");

        assert_eq!(report.invoices_synced, 1);
        assert_eq!(report.invoices_skipped, 1);
    }

    #[tokio::test]
    async fn external_email_send_is_reconciled_once() {
        let mut emailed = saas_invoice(10, 1);
        emailed.sent_time = Some(at("2025-01-11T07:30:00Z"));

        let backend = StubBackend::new(vec![], vec![vec![emailed]]);
        let report =
            sync(&backend, 50).run(at("2025-02-01T03:00:00Z")).await.expect("sync runs");

        assert_eq!(report.emails_reconciled, 1);

        // the note went back to the SaaS and into the mirror record
        let writes = backend.note_writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].1.contains("EMAIL_1=TRUE"));
        assert!(writes[0].1.contains("EMAIL_1_DATE=2025-01-11T07:30:00Z"));

        let mirrored = backend.upserted_invoices.lock().unwrap().clone();
        assert!(mirrored[0].internal_note.contains("EMAIL_1=TRUE"));

        // a second pass over the updated note writes nothing new
        let mut already = saas_invoice(10, 1);
        already.sent_time = Some(at("2025-01-11T07:30:00Z"));
        already.internal_note = Some(mirrored[0].internal_note.clone());

        let backend2 = StubBackend::new(vec![], vec![vec![already]]);
        let report2 =
            sync(&backend2, 50).run(at("2025-02-02T03:00:00Z")).await.expect("sync runs");
        assert_eq!(report2.emails_reconciled, 0);
        assert!(backend2.note_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reconciliation_write_failure_keeps_the_original_note() {
        let mut emailed = saas_invoice(10, 1);
        emailed.sent_time = Some(at("2025-01-11T07:30:00Z"));

        let backend = StubBackend::new(vec![], vec![vec![emailed]]);
        let backend = Arc::new(StubBackend {
            fail_note_writes: true,
            client_pages: backend.client_pages.clone(),
            invoice_pages: backend.invoice_pages.clone(),
            upserted_clients: Mutex::new(Vec::new()),
            upserted_invoices: Mutex::new(Vec::new()),
            note_writes: Mutex::new(Vec::new()),
        });

        let report =
            sync(&backend, 50).run(at("2025-02-01T03:00:00Z")).await.expect("sync runs");

        assert_eq!(report.emails_reconciled, 0);
        assert_eq!(report.errors.len(), 1);

        // mirror stays consistent with what the SaaS actually holds
        let mirrored = backend.upserted_invoices.lock().unwrap().clone();
        assert_eq!(mirrored.len(), 1);
        assert!(!mirrored[0].internal_note.contains("EMAIL_1"));
    }

    #[tokio::test]
    async fn third_reminder_cache_is_recomputed_from_the_note() {
        let mut with_third = saas_invoice(10, 1);
        with_third.internal_note = Some(crate::notes::reminder_ledger::ReminderLedger::set_flag(
            "",
            Channel::Whatsapp,
            ReminderLevel::Third,
            true,
            at("2025-01-20T09:00:00Z"),
        ));

        let backend = StubBackend::new(vec![], vec![vec![with_third, saas_invoice(11, 1)]]);
        let report =
            sync(&backend, 50).run(at("2025-02-01T03:00:00Z")).await.expect("sync runs");

        assert_eq!(report.invoices_synced, 2);
        let mirrored = backend.upserted_invoices.lock().unwrap().clone();
        assert!(mirrored.iter().find(|i| i.id == 10).expect("row").has_third_reminder);
        assert!(!mirrored.iter().find(|i| i.id == 11).expect("row").has_third_reminder);
    }

    #[tokio::test]
    async fn duplicate_invoices_are_grouped_by_fingerprint() {
        // same client, same issue date, same total: one group
        let a = saas_invoice(10, 1);
        let b = saas_invoice(11, 1);
        // different total: no group
        let mut c = saas_invoice(12, 1);
        c.price_gross = 999.0;
        // corrective rows never enter duplicate detection
        let mut fk = saas_invoice(13, 1);
        fk.number = Some("FK2025/01/0013".to_string());

        let backend = StubBackend::new(vec![], vec![vec![a, b, c, fk]]);
        let report =
            sync(&backend, 50).run(at("2025-02-01T03:00:00Z")).await.expect("sync runs");

        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].invoice_ids, vec![10, 11]);
    }
}
