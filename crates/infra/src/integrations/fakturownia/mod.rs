//! Fakturownia invoicing SaaS integration.
//!
//! The SaaS is the system of record for clients, invoices, and the note
//! fields carrying the tag protocol. This module implements the
//! [`InvoicingGateway`](dunner_core::InvoicingGateway) port over its JSON
//! API.

pub mod client;

pub use client::{FakturowniaClient, FakturowniaClientConfig};
