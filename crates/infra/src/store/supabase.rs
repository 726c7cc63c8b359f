//! Supabase mirror store.
//!
//! The mirror is a plain Postgres instance reached over the Supabase
//! PostgREST API: `clients` and `invoices` tables, one row per SaaS record,
//! upserted by primary key. Rows are written with the service-role key.
//! The store never interprets note contents; the tag-laden strings must
//! round-trip byte-for-byte.

use std::time::Duration;

use async_trait::async_trait;
use dunner_core::{ClientRepository, InvoiceRepository};
use dunner_domain::{ClientRecord, DunnerError, InvoiceRecord, Result, SupabaseConfig};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`SupabaseStore`]
#[derive(Debug, Clone)]
pub struct SupabaseStoreConfig {
    /// Project base URL, e.g. `https://abc123.supabase.co`
    pub url: String,
    /// Service-role key
    pub service_key: String,
    pub timeout: Duration,
    pub max_attempts: usize,
}

impl SupabaseStoreConfig {
    pub fn from_config(config: &SupabaseConfig) -> Self {
        Self {
            url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: 3,
        }
    }
}

/// PostgREST-backed repository for both mirror tables
pub struct SupabaseStore {
    config: SupabaseStoreConfig,
    http: HttpClient,
}

impl SupabaseStore {
    pub fn new(config: SupabaseStoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_key)
            .map_err(|_| DunnerError::Config("supabase service key is not header-safe".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| DunnerError::Config("supabase service key is not header-safe".into()))?;
        headers.insert("apikey", key);
        headers.insert("Authorization", bearer);

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .default_headers(headers)
            .build()?;

        Ok(Self { config, http })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.url)
    }

    async fn upsert<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let builder = self
            .http
            .request(Method::POST, self.table_url(table))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);

        let response = self.http.send(builder).await?;
        expect_success(response, table).await?;
        debug!(table, rows = rows.len(), "mirror upsert completed");
        Ok(())
    }

    async fn select<T>(&self, table: &str, query: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let builder = self.http.request(Method::GET, self.table_url(table)).query(query);

        let response = self.http.send(builder).await?;
        let response = expect_success(response, table).await?;

        response.json::<Vec<T>>().await.map_err(|err| {
            DunnerError::Database(format!("failed to parse {table} rows: {err}"))
        })
    }

    async fn patch(
        &self,
        table: &str,
        id: i64,
        body: &serde_json::Value,
    ) -> Result<()> {
        let id_filter = format!("eq.{id}");
        let builder = self
            .http
            .request(Method::PATCH, self.table_url(table))
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(body);

        let response = self.http.send(builder).await?;
        expect_success(response, table).await?;
        Ok(())
    }
}

async fn expect_success(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(DunnerError::Database(format!(
        "supabase error on {context} (HTTP {status}): {body}"
    )))
}

#[async_trait]
impl ClientRepository for SupabaseStore {
    async fn upsert_clients(&self, clients: &[ClientRecord]) -> Result<()> {
        self.upsert("clients", clients).await
    }

    async fn get_client(&self, id: i64) -> Result<Option<ClientRecord>> {
        let id_filter = format!("eq.{id}");
        let rows = self
            .select::<ClientRecord>("clients", &[("id", id_filter.as_str()), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_clients(&self) -> Result<Vec<ClientRecord>> {
        self.select("clients", &[("order", "id.asc")]).await
    }

    async fn update_client_note(&self, id: i64, note: &str) -> Result<()> {
        self.patch("clients", id, &json!({ "note": note })).await
    }
}

#[async_trait]
impl InvoiceRepository for SupabaseStore {
    async fn upsert_invoices(&self, invoices: &[InvoiceRecord]) -> Result<()> {
        self.upsert("invoices", invoices).await
    }

    async fn get_invoice(&self, id: i64) -> Result<Option<InvoiceRecord>> {
        let id_filter = format!("eq.{id}");
        let rows = self
            .select::<InvoiceRecord>("invoices", &[("id", id_filter.as_str()), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_open_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        // PostgREST cannot compare two columns, so the outstanding > 0
        // filter happens here after the status/kind narrowing
        let rows = self
            .select::<InvoiceRecord>(
                "invoices",
                &[("status", "neq.paid"), ("kind", "neq.canceled"), ("order", "id.asc")],
            )
            .await?;
        Ok(rows.into_iter().filter(|invoice| invoice.outstanding() > 0.0).collect())
    }

    async fn list_invoices_for_client(&self, client_id: i64) -> Result<Vec<InvoiceRecord>> {
        let client_filter = format!("eq.{client_id}");
        self.select(
            "invoices",
            &[("client_id", client_filter.as_str()), ("order", "id.asc")],
        )
        .await
    }

    async fn list_third_reminder_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        self.select("invoices", &[("has_third_reminder", "is.true"), ("order", "id.asc")])
            .await
    }

    async fn update_invoice_note(
        &self,
        id: i64,
        note: &str,
        has_third_reminder: bool,
    ) -> Result<()> {
        self.patch(
            "invoices",
            id,
            &json!({ "internal_note": note, "has_third_reminder": has_third_reminder }),
        )
        .await
    }
}
