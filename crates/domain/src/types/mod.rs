//! Domain types and models

pub mod fakturownia;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CORRECTIVE_INVOICE_PREFIX, INVOICE_KIND_CANCELED, INVOICE_STATUS_PAID,
};

/// Reminder delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Sms, Channel::Whatsapp];

    /// Lowercase wire name, as used in API payloads and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Whatsapp => "whatsapp",
        }
    }

    /// Uppercase key prefix used inside the reminder ledger block
    pub fn ledger_prefix(self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
            Self::Whatsapp => "WHATSAPP",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "whatsapp" => Ok(Self::Whatsapp),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reminder escalation level (1..=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderLevel {
    First,
    Second,
    Third,
}

impl ReminderLevel {
    pub const ALL: [ReminderLevel; 3] =
        [ReminderLevel::First, ReminderLevel::Second, ReminderLevel::Third];

    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }

    /// The level that must have been sent before this one, if any
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::First => None,
            Self::Second => Some(Self::First),
            Self::Third => Some(Self::Second),
        }
    }
}

impl std::fmt::Display for ReminderLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Registered-letter state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    /// Letter was posted
    Sent,
    /// Explicitly excluded from letter escalation
    Ignored,
    /// Restored to the awaiting-send bucket (written as the literal `false`)
    Restored,
}

impl LetterStatus {
    /// The literal stored inside the status tag
    pub fn as_tag_value(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Ignored => "ignore",
            Self::Restored => "false",
        }
    }

    pub fn from_tag_value(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(Self::Sent),
            "ignore" => Some(Self::Ignored),
            "false" => Some(Self::Restored),
            _ => None,
        }
    }
}

/// The three client-level flags stored in the client note.
///
/// These are always derived from the note text, never stored separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFlags {
    /// Auto-reminder enrollment (`[WINDYKACJA]`)
    pub windykacja: bool,
    /// Registered letter already escalated (`[LIST_POLECONY]`)
    pub list_polecony: bool,
    /// Explicitly excluded from letter escalation (`[LIST_POLECONY_IGNORED]`)
    pub list_polecony_ignored: bool,
}

/// Partial update of [`ClientFlags`]; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClientFlagsPatch {
    #[serde(default)]
    pub windykacja: Option<bool>,
    #[serde(default)]
    pub list_polecony: Option<bool>,
    #[serde(default)]
    pub list_polecony_ignored: Option<bool>,
}

/// Mirror-store row for a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-text note; the only place mutable protocol state lives
    #[serde(default)]
    pub note: String,
    pub synced_at: DateTime<Utc>,
}

/// Mirror-store row for an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: i64,
    pub client_id: i64,
    pub number: String,
    #[serde(default)]
    pub buyer_name: Option<String>,
    /// Gross total (`price_gross` upstream)
    pub total: f64,
    pub paid: f64,
    pub status: String,
    pub kind: String,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_to: Option<NaiveDate>,
    /// Free-text note carrying the reminder ledger and letter-status tags
    #[serde(default)]
    pub internal_note: String,
    /// Materialized cache of the third-level-reminder predicate. Always
    /// recomputable from `internal_note`; callers must tolerate the cache
    /// and the note transiently disagreeing.
    #[serde(default)]
    pub has_third_reminder: bool,
    pub synced_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Unpaid remainder of the gross total
    pub fn outstanding(&self) -> f64 {
        self.total - self.paid
    }

    pub fn is_paid(&self) -> bool {
        self.status == INVOICE_STATUS_PAID
    }

    pub fn is_canceled(&self) -> bool {
        self.kind == INVOICE_KIND_CANCELED
    }

    /// Corrective/credit notes are excluded from all debt aggregation
    pub fn is_corrective(&self) -> bool {
        self.number.starts_with(CORRECTIVE_INVOICE_PREFIX)
    }
}
