//! Fakturownia API row shapes
//!
//! The SaaS serves loosely-typed JSON: money fields arrive as decimal
//! strings, most fields can be null, and unknown keys come and go between
//! API versions. These adapter structs pin down the fields we consume and
//! keep the leniency at the boundary so records stay well-typed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{ClientRecord, InvoiceRecord};

/// Client row as served by `GET /clients.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FakturowniaClient {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Invoice row as served by `GET /invoices.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FakturowniaInvoice {
    pub id: i64,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub price_gross: f64,
    #[serde(default, deserialize_with = "lenient_money")]
    pub paid: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_to: Option<NaiveDate>,
    #[serde(default)]
    pub internal_note: Option<String>,
    /// Set by the SaaS when it emailed the document through its own
    /// delivery mechanism
    #[serde(default)]
    pub sent_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_status: Option<String>,
}

impl FakturowniaClient {
    /// Adapt the SaaS row into a mirror-store record.
    pub fn into_record(self, synced_at: DateTime<Utc>) -> ClientRecord {
        ClientRecord {
            id: self.id,
            name: self.name.unwrap_or_default(),
            email: self.email,
            phone: self.phone,
            note: self.note.unwrap_or_default(),
            synced_at,
        }
    }
}

impl FakturowniaInvoice {
    /// Adapt the SaaS row into a mirror-store record.
    ///
    /// Returns `None` when the row has no client reference; such rows
    /// (drafts, templates) are skipped by sync. `has_third_reminder` is
    /// left false here and recomputed from the note by the caller.
    pub fn into_record(self, synced_at: DateTime<Utc>) -> Option<InvoiceRecord> {
        let client_id = self.client_id?;
        Some(InvoiceRecord {
            id: self.id,
            client_id,
            number: self.number.unwrap_or_default(),
            buyer_name: self.buyer_name,
            total: self.price_gross,
            paid: self.paid,
            status: self.status.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            issue_date: self.issue_date,
            payment_to: self.payment_to,
            internal_note: self.internal_note.unwrap_or_default(),
            has_third_reminder: false,
            synced_at,
        })
    }
}

/// Accept `"123.45"`, `123.45`, `123`, or null; anything unparseable is 0.
fn lenient_money<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Null(Option<()>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(value) => value,
        Raw::Text(text) => text.trim().parse().unwrap_or(0.0),
        Raw::Null(_) => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_fields_accept_strings_numbers_and_null() {
        let raw = r#"{
            "id": 7,
            "client_id": 3,
            "number": "2025/02/0007",
            "price_gross": "150.50",
            "paid": 30,
            "status": "sent",
            "kind": "vat",
            "internal_note": null
        }"#;

        let invoice: FakturowniaInvoice = serde_json::from_str(raw).expect("invoice parses");
        assert_eq!(invoice.price_gross, 150.50);
        assert_eq!(invoice.paid, 30.0);

        let record = invoice.into_record(Utc::now()).expect("has client_id");
        assert_eq!(record.outstanding(), 120.50);
        assert_eq!(record.internal_note, "");
    }

    #[test]
    fn unparseable_money_falls_back_to_zero() {
        let raw = r#"{"id": 1, "client_id": 2, "price_gross": "n/a"}"#;
        let invoice: FakturowniaInvoice = serde_json::from_str(raw).expect("invoice parses");
        assert_eq!(invoice.price_gross, 0.0);
    }

    #[test]
    fn invoice_without_client_is_skipped() {
        let raw = r#"{"id": 1, "number": "draft"}"#;
        let invoice: FakturowniaInvoice = serde_json::from_str(raw).expect("invoice parses");
        assert!(invoice.into_record(Utc::now()).is_none());
    }

    #[test]
    fn client_note_defaults_to_empty() {
        let raw = r#"{"id": 5, "name": "Jan Kowalski", "note": null}"#;
        let client: FakturowniaClient = serde_json::from_str(raw).expect("client parses");
        let record = client.into_record(Utc::now());
        assert_eq!(record.note, "");
        assert_eq!(record.name, "Jan Kowalski");
    }
}
