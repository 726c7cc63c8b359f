//! Application context: configuration wired into adapters and services.
//!
//! The composition root. Adapters (SaaS client, mirror store, message
//! providers) are constructed once here and injected into the core
//! services as trait objects; nothing below this layer touches
//! configuration or constructs its own collaborators.

use std::sync::Arc;

use dunner_core::{
    ClientRepository, EscalationService, FlagService, InvoiceRepository, InvoicingGateway,
    MessageSender, ReminderService, SyncService,
};
use dunner_domain::{Config, Result};
use dunner_infra::integrations::fakturownia::{FakturowniaClient, FakturowniaClientConfig};
use dunner_infra::messaging::{
    ChannelRouter, FakturowniaEmailSender, SmsApiSender, TwilioWhatsAppSender,
};
use dunner_infra::store::{SupabaseStore, SupabaseStoreConfig};
use tracing::info;

use crate::auth::AuthService;

/// Shared application state for the HTTP layer
pub struct AppContext {
    pub auth: AuthService,
    pub flags: Arc<FlagService>,
    pub reminders: Arc<ReminderService>,
    pub escalations: Arc<EscalationService>,
    pub sync: Arc<SyncService>,
}

impl AppContext {
    /// Build the full production wiring from configuration.
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let fakturownia = Arc::new(FakturowniaClient::new(
            FakturowniaClientConfig::from_config(&config.fakturownia),
        )?);
        let store = Arc::new(SupabaseStore::new(SupabaseStoreConfig::from_config(
            &config.supabase,
        ))?);

        let mut router = ChannelRouter::new()
            .with_email(Arc::new(FakturowniaEmailSender::new(fakturownia.clone())));
        if let Some(sms) = &config.messaging.sms {
            router = router.with_sms(Arc::new(SmsApiSender::new(sms)?));
        }
        if let Some(whatsapp) = &config.messaging.whatsapp {
            router = router.with_whatsapp(Arc::new(TwilioWhatsAppSender::new(whatsapp)?));
        }

        let gateway: Arc<dyn InvoicingGateway> = fakturownia;
        let clients: Arc<dyn ClientRepository> = store.clone();
        let invoices: Arc<dyn InvoiceRepository> = store;
        let sender: Arc<dyn MessageSender> = Arc::new(router);

        info!(
            sms = config.messaging.sms.is_some(),
            whatsapp = config.messaging.whatsapp.is_some(),
            "application context assembled"
        );

        Ok(Self::from_parts(
            AuthService::new(config.auth.clone()),
            gateway,
            clients,
            invoices,
            sender,
            config.sync.page_size,
        ))
    }

    /// Assemble the context from already-constructed collaborators.
    ///
    /// Production goes through [`AppContext::from_config`]; tests inject
    /// stub ports here.
    pub fn from_parts(
        auth: AuthService,
        gateway: Arc<dyn InvoicingGateway>,
        clients: Arc<dyn ClientRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        sender: Arc<dyn MessageSender>,
        sync_page_size: usize,
    ) -> Arc<Self> {
        let flags = Arc::new(FlagService::new(gateway.clone(), clients.clone(), invoices.clone()));
        let reminders = Arc::new(ReminderService::new(
            clients.clone(),
            invoices.clone(),
            sender,
            flags.clone(),
        ));
        let escalations = Arc::new(EscalationService::new(clients.clone(), invoices.clone()));
        let sync = Arc::new(SyncService::new(gateway, clients, invoices, sync_page_size));

        Arc::new(Self { auth, flags, reminders, escalations, sync })
    }
}
