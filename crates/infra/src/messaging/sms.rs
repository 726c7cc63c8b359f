//! SMS reminder delivery through SMSAPI.
//!
//! Single-message sends against the `/sms.do` endpoint with bearer-token
//! auth. SMSAPI reports failures both through HTTP status codes and through
//! an `error` field in an otherwise successful response; both are surfaced
//! as provider errors.

use std::time::Duration;

use dunner_domain::{ClientRecord, DunnerError, InvoiceRecord, Result, ReminderLevel, SmsConfig};
use reqwest::Method;
use tracing::{debug, info};

use super::templates::reminder_message;
use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// SMS channel provider backed by SMSAPI
pub struct SmsApiSender {
    http: HttpClient,
    base_url: String,
    token: String,
    from: String,
}

impl SmsApiSender {
    pub fn new(config: &SmsConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .max_attempts(2)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            from: config.from.clone(),
        })
    }

    pub async fn send(
        &self,
        client: &ClientRecord,
        invoice: &InvoiceRecord,
        level: ReminderLevel,
    ) -> Result<()> {
        let phone = client
            .phone
            .as_deref()
            .filter(|phone| !phone.is_empty())
            .ok_or_else(|| {
                DunnerError::Provider(format!("client {} has no phone number", client.id))
            })?;

        let message = reminder_message(invoice, level);
        debug!(invoice_id = invoice.id, client_id = client.id, %level, "sending SMS reminder");

        let builder = self
            .http
            .request(Method::POST, format!("{}/sms.do", self.base_url))
            .bearer_auth(&self.token)
            .form(&[
                ("to", phone),
                ("from", self.from.as_str()),
                ("message", message.as_str()),
                ("format", "json"),
            ]);

        let response = self.http.send(builder).await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|err| {
            DunnerError::Provider(format!("unreadable SMSAPI response: {err}"))
        })?;

        if !status.is_success() || body.get("error").is_some() {
            return Err(DunnerError::Provider(format!(
                "SMSAPI rejected the message (HTTP {status}): {body}"
            )));
        }

        info!(invoice_id = invoice.id, client_id = client.id, %level, "SMS reminder sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sender(base_url: String) -> SmsApiSender {
        SmsApiSender::new(&SmsConfig {
            token: "sms-token".to_string(),
            from: "CareBilling".to_string(),
            base_url,
        })
        .expect("sender builds")
    }

    fn client_with_phone(phone: Option<&str>) -> ClientRecord {
        ClientRecord {
            id: 5,
            name: "Jan Kowalski".to_string(),
            email: None,
            phone: phone.map(str::to_string),
            note: String::new(),
            synced_at: Utc::now(),
        }
    }

    fn invoice() -> InvoiceRecord {
        InvoiceRecord {
            id: 42,
            client_id: 5,
            number: "2025/01/0042".to_string(),
            buyer_name: None,
            total: 90.0,
            paid: 0.0,
            status: "issued".to_string(),
            kind: "vat".to_string(),
            issue_date: None,
            payment_to: None,
            internal_note: String::new(),
            has_third_reminder: false,
            synced_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sends_the_rendered_message_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms.do"))
            .and(header("Authorization", "Bearer sms-token"))
            .and(body_string_contains("to=%2B48500100200"))
            .and(body_string_contains("2025%2F01%2F0042"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"count": 1, "list": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        sender(server.uri())
            .send(&client_with_phone(Some("+48500100200")), &invoice(), ReminderLevel::First)
            .await
            .expect("send succeeds");
    }

    #[tokio::test]
    async fn missing_phone_is_a_provider_error() {
        let server = MockServer::start().await;
        let err = sender(server.uri())
            .send(&client_with_phone(None), &invoice(), ReminderLevel::First)
            .await
            .unwrap_err();
        assert!(matches!(err, DunnerError::Provider(_)));
    }

    #[tokio::test]
    async fn error_field_in_a_successful_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"error": 101, "message": "invalid token"}),
            ))
            .mount(&server)
            .await;

        let err = sender(server.uri())
            .send(&client_with_phone(Some("+48500100200")), &invoice(), ReminderLevel::First)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid token"));
    }
}
