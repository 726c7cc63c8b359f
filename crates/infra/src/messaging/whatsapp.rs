//! WhatsApp reminder delivery through the Twilio messaging API.

use std::time::Duration;

use dunner_domain::{
    ClientRecord, DunnerError, InvoiceRecord, Result, ReminderLevel, WhatsAppConfig,
};
use reqwest::Method;
use tracing::{debug, info};

use super::templates::reminder_message;
use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// WhatsApp channel provider backed by Twilio
pub struct TwilioWhatsAppSender {
    http: HttpClient,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioWhatsAppSender {
    pub fn new(config: &WhatsAppConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .max_attempts(2)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
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

        let to = format!("whatsapp:{phone}");
        let body = reminder_message(invoice, level);
        debug!(invoice_id = invoice.id, client_id = client.id, %level, "sending WhatsApp reminder");

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let builder = self
            .http
            .request(Method::POST, url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", self.from.as_str()), ("Body", body.as_str())]);

        let response = self.http.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DunnerError::Provider(format!(
                "Twilio rejected the message (HTTP {status}): {body}"
            )));
        }

        info!(invoice_id = invoice.id, client_id = client.id, %level, "WhatsApp reminder sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sender(base_url: String) -> TwilioWhatsAppSender {
        TwilioWhatsAppSender::new(&WhatsAppConfig {
            account_sid: "AC123".to_string(),
            auth_token: "twilio-secret".to_string(),
            from: "whatsapp:+48700800900".to_string(),
            base_url,
        })
        .expect("sender builds")
    }

    fn client() -> ClientRecord {
        ClientRecord {
            id: 5,
            name: "Jan Kowalski".to_string(),
            email: None,
            phone: Some("+48500100200".to_string()),
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
    async fn posts_to_the_account_scoped_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(body_string_contains("To=whatsapp%3A%2B48500100200"))
            .and(body_string_contains("From=whatsapp%3A%2B48700800900"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"sid": "SM1", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        sender(server.uri())
            .send(&client(), &invoice(), ReminderLevel::Second)
            .await
            .expect("send succeeds");
    }

    #[tokio::test]
    async fn twilio_errors_become_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"code": 21211, "message": "Invalid 'To' number"}),
            ))
            .mount(&server)
            .await;

        let err = sender(server.uri())
            .send(&client(), &invoice(), ReminderLevel::Second)
            .await
            .unwrap_err();
        assert!(matches!(err, DunnerError::Provider(_)));
        assert!(err.to_string().contains("21211"));
    }
}
