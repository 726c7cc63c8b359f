//! Channel dispatch for the core message-sender port.

use std::sync::Arc;

use async_trait::async_trait;
use dunner_core::MessageSender;
use dunner_domain::{Channel, ClientRecord, DunnerError, InvoiceRecord, ReminderLevel, Result};

use super::email::FakturowniaEmailSender;
use super::sms::SmsApiSender;
use super::whatsapp::TwilioWhatsAppSender;

/// Dispatches reminder sends to the configured per-channel providers.
///
/// Channels without a provider fail per-send; the batch runner records
/// those as per-item failures instead of aborting.
#[derive(Default)]
pub struct ChannelRouter {
    email: Option<Arc<FakturowniaEmailSender>>,
    sms: Option<Arc<SmsApiSender>>,
    whatsapp: Option<Arc<TwilioWhatsAppSender>>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, sender: Arc<FakturowniaEmailSender>) -> Self {
        self.email = Some(sender);
        self
    }

    pub fn with_sms(mut self, sender: Arc<SmsApiSender>) -> Self {
        self.sms = Some(sender);
        self
    }

    pub fn with_whatsapp(mut self, sender: Arc<TwilioWhatsAppSender>) -> Self {
        self.whatsapp = Some(sender);
        self
    }

    fn not_configured(channel: Channel) -> DunnerError {
        DunnerError::Provider(format!("{channel} channel is not configured"))
    }
}

#[async_trait]
impl MessageSender for ChannelRouter {
    async fn send_reminder(
        &self,
        client: &ClientRecord,
        invoice: &InvoiceRecord,
        channel: Channel,
        level: ReminderLevel,
    ) -> Result<()> {
        match channel {
            Channel::Email => {
                let sender =
                    self.email.as_ref().ok_or_else(|| Self::not_configured(channel))?;
                sender.send(client, invoice).await
            }
            Channel::Sms => {
                let sender = self.sms.as_ref().ok_or_else(|| Self::not_configured(channel))?;
                sender.send(client, invoice, level).await
            }
            Channel::Whatsapp => {
                let sender =
                    self.whatsapp.as_ref().ok_or_else(|| Self::not_configured(channel))?;
                sender.send(client, invoice, level).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn unconfigured_channel_yields_a_provider_error() {
        let router = ChannelRouter::new();
        let client = ClientRecord {
            id: 1,
            name: "Client".to_string(),
            email: None,
            phone: None,
            note: String::new(),
            synced_at: Utc::now(),
        };
        let invoice = InvoiceRecord {
            id: 1,
            client_id: 1,
            number: "2025/01/0001".to_string(),
            buyer_name: None,
            total: 10.0,
            paid: 0.0,
            status: "issued".to_string(),
            kind: "vat".to_string(),
            issue_date: None,
            payment_to: None,
            internal_note: String::new(),
            has_third_reminder: false,
            synced_at: Utc::now(),
        };

        let err = router
            .send_reminder(&client, &invoice, Channel::Sms, ReminderLevel::First)
            .await
            .unwrap_err();
        assert!(matches!(err, DunnerError::Provider(_)));
        assert!(err.to_string().contains("sms"));
    }
}
