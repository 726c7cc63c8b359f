//! Fakturownia API client.
//!
//! Account-scoped base URL (`https://<account>.fakturownia.pl`), token
//! authentication via the `api_token` parameter, JSON bodies wrapped in
//! `{"client": ...}` / `{"invoice": ...}` envelopes on writes. Note fields
//! are passed through verbatim in both directions; the tag syntax inside
//! them must survive untouched.

use std::time::Duration;

use async_trait::async_trait;
use dunner_domain::types::fakturownia::{FakturowniaClient as ClientDto, FakturowniaInvoice};
use dunner_domain::{DunnerError, FakturowniaConfig, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::http::HttpClient;
use dunner_core::InvoicingGateway;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`FakturowniaClient`]
#[derive(Debug, Clone)]
pub struct FakturowniaClientConfig {
    /// Account base URL, e.g. `https://myaccount.fakturownia.pl`
    pub base_url: String,
    /// API token passed as the `api_token` parameter
    pub api_token: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max attempts for transient failures
    pub max_attempts: usize,
    /// Minimum spacing between requests (SaaS politeness)
    pub request_interval: Duration,
}

impl FakturowniaClientConfig {
    pub fn from_config(config: &FakturowniaConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: 3,
            request_interval: Duration::from_millis(config.write_delay_ms),
        }
    }
}

/// HTTP client for the Fakturownia API
pub struct FakturowniaClient {
    config: FakturowniaClientConfig,
    http: HttpClient,
}

impl FakturowniaClient {
    pub fn new(config: FakturowniaClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .min_request_interval(config.request_interval)
            .build()?;

        Ok(Self { config, http })
    }

    /// Trigger the SaaS's own invoice e-mail delivery.
    pub async fn send_invoice_by_email(&self, invoice_id: i64) -> Result<()> {
        let url = format!("{}/invoices/{invoice_id}/send_by_email.json", self.config.base_url);
        let builder = self
            .http
            .request(Method::POST, &url)
            .query(&[("api_token", self.config.api_token.as_str())]);

        let response = self.http.send(builder).await?;
        expect_success(response, "send_by_email").await?;
        info!(invoice_id, "invoice e-mail dispatched through the SaaS");
        Ok(())
    }

    async fn get_json<T>(&self, path: &str, extra_query: &[(&str, String)]) -> Result<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = format!("{}{path}", self.config.base_url);
        let mut builder = self
            .http
            .request(Method::GET, &url)
            .query(&[("api_token", self.config.api_token.as_str())]);
        for (key, value) in extra_query {
            builder = builder.query(&[(*key, value.as_str())]);
        }

        let response = self.http.send(builder).await?;
        let response = expect_success(response, path).await?;

        response.json::<T>().await.map_err(|err| {
            DunnerError::Internal(format!("failed to parse Fakturownia response for {path}: {err}"))
        })
    }

    async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = format!("{}{path}", self.config.base_url);
        let builder = self.http.request(Method::PUT, &url).json(body);

        let response = self.http.send(builder).await?;
        expect_success(response, path).await?;
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
    Err(DunnerError::Network(format!(
        "Fakturownia API error on {context} (HTTP {status}): {body}"
    )))
}

#[async_trait]
impl InvoicingGateway for FakturowniaClient {
    async fn fetch_client(&self, client_id: i64) -> Result<ClientDto> {
        self.get_json(&format!("/clients/{client_id}.json"), &[]).await
    }

    async fn fetch_invoice(&self, invoice_id: i64) -> Result<FakturowniaInvoice> {
        self.get_json(&format!("/invoices/{invoice_id}.json"), &[]).await
    }

    async fn list_clients(&self, page: usize, per_page: usize) -> Result<Vec<ClientDto>> {
        debug!(page, per_page, "listing Fakturownia clients");
        self.get_json(
            "/clients.json",
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    async fn list_invoices(&self, page: usize, per_page: usize) -> Result<Vec<FakturowniaInvoice>> {
        debug!(page, per_page, "listing Fakturownia invoices");
        self.get_json(
            "/invoices.json",
            &[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("period", "all".to_string()),
            ],
        )
        .await
    }

    async fn update_client_note(&self, client_id: i64, note: &str) -> Result<()> {
        let body = json!({
            "api_token": self.config.api_token,
            "client": { "note": note },
        });
        self.put_json(&format!("/clients/{client_id}.json"), &body).await?;
        info!(client_id, "client note updated in the SaaS");
        Ok(())
    }

    async fn update_invoice_note(&self, invoice_id: i64, note: &str) -> Result<()> {
        let body = json!({
            "api_token": self.config.api_token,
            "invoice": { "internal_note": note },
        });
        self.put_json(&format!("/invoices/{invoice_id}.json"), &body).await?;
        info!(invoice_id, "invoice note updated in the SaaS");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(base_url: String) -> FakturowniaClient {
        FakturowniaClient::new(FakturowniaClientConfig {
            base_url,
            api_token: "test-token".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts: 1,
            request_interval: Duration::ZERO,
        })
        .expect("client builds")
    }

    #[tokio::test]
    async fn lists_clients_with_token_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients.json"))
            .and(query_param("api_token", "test-token"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "Jan Kowalski", "note": "[WINDYKACJA]true[/WINDYKACJA]"}
            ])))
            .mount(&server)
            .await;

        let clients =
            test_client(server.uri()).list_clients(2, 100).await.expect("list succeeds");

        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].note.as_deref(), Some("[WINDYKACJA]true[/WINDYKACJA]"));
    }

    #[tokio::test]
    async fn updates_invoice_note_with_envelope_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/invoices/42.json"))
            .and(body_partial_json(serde_json::json!({
                "api_token": "test-token",
                "invoice": {"internal_note": "[FISCAL_SYNC]\nSTOP=TRUE\n[/FISCAL_SYNC]"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 42})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(server.uri())
            .update_invoice_note(42, "[FISCAL_SYNC]\nSTOP=TRUE\n[/FISCAL_SYNC]")
            .await
            .expect("update succeeds");
    }

    #[tokio::test]
    async fn surfaces_api_errors_with_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invoices/7.json"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = test_client(server.uri()).fetch_invoice(7).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("invalid token"));
    }

    #[tokio::test]
    async fn sends_invoice_email_through_the_saas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invoices/42/send_by_email.json"))
            .and(query_param("api_token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(server.uri()).send_invoice_by_email(42).await.expect("send succeeds");
    }
}
