//! External service integrations

pub mod fakturownia;

pub use fakturownia::{FakturowniaClient, FakturowniaClientConfig};
