//! End-to-end sync pass over mocked Fakturownia and Supabase servers.
//!
//! Exercises the real HTTP adapters wired into the core sync service: SaaS
//! paging, external e-mail reconciliation written back to the SaaS, and
//! mirror upserts with the recomputed third-reminder column.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dunner_core::SyncService;
use dunner_infra::integrations::fakturownia::{FakturowniaClient, FakturowniaClientConfig};
use dunner_infra::store::{SupabaseStore, SupabaseStoreConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fakturownia(base_url: String) -> Arc<FakturowniaClient> {
    Arc::new(
        FakturowniaClient::new(FakturowniaClientConfig {
            base_url,
            api_token: "test-token".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts: 1,
            request_interval: Duration::ZERO,
        })
        .expect("fakturownia client builds"),
    )
}

fn supabase(base_url: String) -> Arc<SupabaseStore> {
    Arc::new(
        SupabaseStore::new(SupabaseStoreConfig {
            url: base_url,
            service_key: "service-key".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts: 1,
        })
        .expect("supabase store builds"),
    )
}

#[tokio::test]
async fn full_sync_pass_mirrors_and_reconciles() {
    let saas = MockServer::start().await;
    let store_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 1,
                "name": "Jan Kowalski",
                "email": "jan@example.com",
                "note": "[WINDYKACJA]true[/WINDYKACJA]"
            }
        ])))
        .mount(&saas)
        .await;

    Mock::given(method("GET"))
        .and(path("/invoices.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 10,
                "client_id": 1,
                "number": "2025/01/0010",
                "price_gross": "120.00",
                "paid": "0.00",
                "status": "sent",
                "kind": "vat",
                "issue_date": "2025-01-05",
                "internal_note": "",
                "sent_time": "2025-01-05T08:00:00Z"
            },
            {
                "id": 11,
                "client_id": 1,
                "number": "2025/01/0011",
                "price_gross": "80.00",
                "paid": "80.00",
                "status": "paid",
                "kind": "vat",
                "issue_date": "2025-01-06",
                "internal_note": "[FISCAL_SYNC]\nSMS_3=TRUE\nSMS_3_DATE=2025-01-20T10:00:00Z\n[/FISCAL_SYNC]"
            }
        ])))
        .mount(&saas)
        .await;

    // reconciliation writes the synthesized EMAIL level-1 entry back
    Mock::given(method("PUT"))
        .and(path("/invoices/10.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 10})))
        .expect(1)
        .named("reconciliation note write")
        .mount(&saas)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/clients"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .named("client upsert")
        .mount(&store_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/invoices"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .named("invoice upsert")
        .mount(&store_server)
        .await;

    let gateway = fakturownia(saas.uri());
    let store = supabase(store_server.uri());
    let sync = SyncService::new(gateway, store.clone(), store, 100);

    let report = sync.run(Utc::now()).await.expect("sync pass runs");

    assert_eq!(report.clients_synced, 1);
    assert_eq!(report.invoices_synced, 2);
    assert_eq!(report.emails_reconciled, 1);
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);

    // the SaaS note write carried the synthesized ledger entry
    let saas_requests = saas.received_requests().await.expect("saas requests recorded");
    let reconciliation = saas_requests
        .iter()
        .find(|request| request.method == wiremock::http::Method::PUT)
        .expect("reconciliation request present");
    let body = String::from_utf8_lossy(&reconciliation.body);
    assert!(body.contains("EMAIL_1=TRUE"));
    assert!(body.contains("EMAIL_1_DATE=2025-01-05T08:00:00Z"));

    // the mirror upsert carried the recomputed third-reminder column
    let store_requests =
        store_server.received_requests().await.expect("store requests recorded");
    let invoice_upsert = store_requests
        .iter()
        .find(|request| request.url.path() == "/rest/v1/invoices")
        .expect("invoice upsert present");
    let rows: serde_json::Value =
        serde_json::from_slice(&invoice_upsert.body).expect("upsert body is json");
    let with_third = rows
        .as_array()
        .expect("array body")
        .iter()
        .find(|row| row["id"] == 11)
        .expect("row 11 present");
    assert_eq!(with_third["has_third_reminder"], serde_json::Value::Bool(true));
}

#[tokio::test]
async fn saas_outage_is_reported_not_fatal() {
    let saas = MockServer::start().await;
    let store_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&saas)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoices.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&saas)
        .await;

    let gateway = fakturownia(saas.uri());
    let store = supabase(store_server.uri());
    let sync = SyncService::new(gateway, store.clone(), store, 100);

    let report = sync.run(Utc::now()).await.expect("sync still returns a report");

    assert_eq!(report.clients_synced, 0);
    assert_eq!(report.invoices_synced, 0);
    assert_eq!(report.errors.len(), 2);
}
