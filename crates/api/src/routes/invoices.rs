//! Flag and reminder mutation routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use dunner_core::collection::SentReminder;
use dunner_domain::{Channel, ClientFlags, ClientFlagsPatch, DunnerError, ReminderLevel};
use serde::Deserialize;

use super::ApiError;
use crate::context::AppContext;

pub async fn update_client_flags(
    State(context): State<Arc<AppContext>>,
    Path(client_id): Path<i64>,
    Json(patch): Json<ClientFlagsPatch>,
) -> Result<Json<ClientFlags>, ApiError> {
    let flags = context.flags.set_client_flags(client_id, patch).await?;
    Ok(Json(flags))
}

#[derive(Debug, Deserialize)]
pub struct SendReminderRequest {
    pub channel: Channel,
    pub level: u8,
}

pub async fn send_reminder(
    State(context): State<Arc<AppContext>>,
    Path(invoice_id): Path<i64>,
    Json(body): Json<SendReminderRequest>,
) -> Result<Json<SentReminder>, ApiError> {
    let level = ReminderLevel::from_number(body.level).ok_or_else(|| {
        ApiError(DunnerError::InvalidInput(format!("reminder level {} out of range", body.level)))
    })?;

    let sent =
        context.reminders.send_single(invoice_id, body.channel, level, Utc::now()).await?;
    Ok(Json(sent))
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub stop: bool,
}

pub async fn set_stop(
    State(context): State<Arc<AppContext>>,
    Path(invoice_id): Path<i64>,
    Json(body): Json<StopRequest>,
) -> Result<StatusCode, ApiError> {
    context.flags.set_stop(invoice_id, body.stop, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct LetterSentRequest {
    /// Posting date; defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

pub async fn letter_sent(
    State(context): State<Arc<AppContext>>,
    Path(invoice_id): Path<i64>,
    body: Option<Json<LetterSentRequest>>,
) -> Result<StatusCode, ApiError> {
    let date = body
        .and_then(|Json(request)| request.date)
        .unwrap_or_else(|| Utc::now().date_naive());
    context.flags.mark_letter_sent(invoice_id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn letter_ignore(
    State(context): State<Arc<AppContext>>,
    Path(invoice_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    context.flags.ignore_letter(invoice_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn letter_restore(
    State(context): State<Arc<AppContext>>,
    Path(invoice_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    context.flags.restore_letter(invoice_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
