//! Outbound reminder delivery.
//!
//! One provider per channel, plus a [`ChannelRouter`] that implements the
//! core [`MessageSender`](dunner_core::MessageSender) port by dispatching
//! on channel. Channels left unconfigured fail per-send with a provider
//! error; the batch runner records those per item and moves on.

pub mod email;
pub mod router;
pub mod sms;
pub mod templates;
pub mod whatsapp;

pub use email::FakturowniaEmailSender;
pub use router::ChannelRouter;
pub use sms::SmsApiSender;
pub use whatsapp::TwilioWhatsAppSender;
