//! Application configuration structures
//!
//! Plain serde-deserializable config. Loading (environment probing, file
//! fallback) lives in the infra crate; these types only describe the shape.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SAAS_WRITE_DELAY_MS, DEFAULT_SYNC_PAGE_SIZE};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub fakturownia: FakturowniaConfig,
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    pub auth: AuthConfig,
}

/// Invoicing SaaS (Fakturownia) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakturowniaConfig {
    /// Account base URL, e.g. `https://myaccount.fakturownia.pl`
    pub base_url: String,
    /// API token passed as the `api_token` query parameter
    pub api_token: String,
    /// Minimum delay between successive write calls, in milliseconds
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,
}

/// Supabase (PostgREST) mirror store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abc123.supabase.co`
    pub url: String,
    /// Service-role key; the mirror is written with full privileges
    pub service_key: String,
}

/// Outbound messaging provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub sms: Option<SmsConfig>,
    #[serde(default)]
    pub whatsapp: Option<WhatsAppConfig>,
}

/// SMSAPI settings for the SMS channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub token: String,
    /// Sender name registered with the provider
    pub from: String,
    #[serde(default = "default_smsapi_url")]
    pub base_url: String,
}

/// Twilio settings for the WhatsApp channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in `whatsapp:+48...` form
    pub from: String,
    #[serde(default = "default_twilio_url")]
    pub base_url: String,
}

/// Sync orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the periodic full sync
    #[serde(default = "default_sync_cron")]
    pub sync_cron: String,
    /// Cron expression for the reminder batch run
    #[serde(default = "default_reminder_cron")]
    pub reminder_cron: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_cron: default_sync_cron(),
            reminder_cron: default_reminder_cron(),
            page_size: default_page_size(),
        }
    }
}

/// API authentication settings: one operator credential pair plus the token
/// signing secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub login: String,
    pub password: String,
    pub token_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_write_delay_ms() -> u64 {
    DEFAULT_SAAS_WRITE_DELAY_MS
}

fn default_page_size() -> usize {
    DEFAULT_SYNC_PAGE_SIZE
}

fn default_smsapi_url() -> String {
    "https://api.smsapi.pl".to_string()
}

fn default_twilio_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_sync_cron() -> String {
    // every day at 03:15
    "0 15 3 * * *".to_string()
}

fn default_reminder_cron() -> String {
    // weekdays at 09:30
    "0 30 9 * * Mon-Fri".to_string()
}

fn default_token_ttl() -> i64 {
    12 * 60 * 60
}

fn default_true() -> bool {
    true
}
