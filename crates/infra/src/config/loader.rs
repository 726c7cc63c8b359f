//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports TOML and JSON formats
//!
//! ## Environment Variables
//! - `DUNNER_FAKTUROWNIA_URL` / `DUNNER_FAKTUROWNIA_TOKEN`: SaaS account
//! - `DUNNER_FAKTUROWNIA_WRITE_DELAY_MS`: write spacing (optional)
//! - `DUNNER_SUPABASE_URL` / `DUNNER_SUPABASE_SERVICE_KEY`: mirror store
//! - `DUNNER_AUTH_LOGIN` / `DUNNER_AUTH_PASSWORD` /
//!   `DUNNER_AUTH_TOKEN_SECRET` / `DUNNER_AUTH_TOKEN_TTL_SECS`: API auth
//! - `DUNNER_SMS_TOKEN` / `DUNNER_SMS_FROM` / `DUNNER_SMS_URL`: SMS channel
//!   (optional)
//! - `DUNNER_WHATSAPP_SID` / `DUNNER_WHATSAPP_TOKEN` /
//!   `DUNNER_WHATSAPP_FROM` / `DUNNER_WHATSAPP_URL`: WhatsApp channel
//!   (optional)
//! - `DUNNER_SYNC_ENABLED` / `DUNNER_SYNC_CRON` / `DUNNER_REMINDER_CRON` /
//!   `DUNNER_SYNC_PAGE_SIZE`: sync orchestration (optional)

use std::env;
use std::path::{Path, PathBuf};

use dunner_domain::{
    AuthConfig, Config, DunnerError, FakturowniaConfig, MessagingConfig, Result, SmsConfig,
    SupabaseConfig, SyncConfig, WhatsAppConfig,
};

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
pub fn load_from_env() -> Result<Config> {
    let fakturownia = FakturowniaConfig {
        base_url: required("DUNNER_FAKTUROWNIA_URL")?,
        api_token: required("DUNNER_FAKTUROWNIA_TOKEN")?,
        write_delay_ms: optional_parsed("DUNNER_FAKTUROWNIA_WRITE_DELAY_MS")?
            .unwrap_or(dunner_domain::constants::DEFAULT_SAAS_WRITE_DELAY_MS),
    };

    let supabase = SupabaseConfig {
        url: required("DUNNER_SUPABASE_URL")?,
        service_key: required("DUNNER_SUPABASE_SERVICE_KEY")?,
    };

    let auth = AuthConfig {
        login: required("DUNNER_AUTH_LOGIN")?,
        password: required("DUNNER_AUTH_PASSWORD")?,
        token_secret: required("DUNNER_AUTH_TOKEN_SECRET")?,
        token_ttl_secs: optional_parsed("DUNNER_AUTH_TOKEN_TTL_SECS")?.unwrap_or(12 * 60 * 60),
    };

    let sms = match (optional("DUNNER_SMS_TOKEN"), optional("DUNNER_SMS_FROM")) {
        (Some(token), Some(from)) => Some(SmsConfig {
            token,
            from,
            base_url: optional("DUNNER_SMS_URL")
                .unwrap_or_else(|| "https://api.smsapi.pl".to_string()),
        }),
        _ => None,
    };

    let whatsapp = match (
        optional("DUNNER_WHATSAPP_SID"),
        optional("DUNNER_WHATSAPP_TOKEN"),
        optional("DUNNER_WHATSAPP_FROM"),
    ) {
        (Some(account_sid), Some(auth_token), Some(from)) => Some(WhatsAppConfig {
            account_sid,
            auth_token,
            from,
            base_url: optional("DUNNER_WHATSAPP_URL")
                .unwrap_or_else(|| "https://api.twilio.com".to_string()),
        }),
        _ => None,
    };

    let defaults = SyncConfig::default();
    let sync = SyncConfig {
        enabled: optional_parsed("DUNNER_SYNC_ENABLED")?.unwrap_or(defaults.enabled),
        sync_cron: optional("DUNNER_SYNC_CRON").unwrap_or(defaults.sync_cron),
        reminder_cron: optional("DUNNER_REMINDER_CRON").unwrap_or(defaults.reminder_cron),
        page_size: optional_parsed("DUNNER_SYNC_PAGE_SIZE")?.unwrap_or(defaults.page_size),
    };

    Ok(Config { fakturownia, supabase, messaging: MessagingConfig { sms, whatsapp }, auth, sync })
}

/// Load configuration from a file, probing standard locations when no path
/// is given
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            DunnerError::Config("no config file found in probed locations".into())
        })?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|err| {
        DunnerError::Config(format!("cannot read {}: {err}", path.display()))
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            toml::from_str(&raw).map_err(|err| DunnerError::from(InfraError::from(err)))?
        }
        Some("json") => {
            serde_json::from_str(&raw).map_err(|err| DunnerError::from(InfraError::from(err)))?
        }
        other => {
            return Err(DunnerError::Config(format!(
                "unsupported config format: {other:?} ({})",
                path.display()
            )));
        }
    };

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

/// Probe standard locations for a config file
fn probe_config_paths() -> Option<PathBuf> {
    let names = ["config.toml", "config.json", "dunner.toml", "dunner.json"];
    let dirs = [".", "..", "../.."];

    for dir in dirs {
        for name in names {
            let candidate = Path::new(dir).join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DunnerError::Config(format!("missing environment variable {name}")))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn optional_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match optional(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            DunnerError::Config(format!("environment variable {name} has an invalid value"))
        }),
    }
}
