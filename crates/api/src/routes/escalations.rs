//! Escalation and debtor listing routes

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use dunner_core::collection::{Debtor, LetterCandidate};
use dunner_domain::constants::COLLECTIONS_MIN_DAYS;
use dunner_domain::InvoiceRecord;

use super::ApiError;
use crate::context::AppContext;

pub async fn list_debtors(
    State(context): State<Arc<AppContext>>,
) -> Result<Json<Vec<Debtor>>, ApiError> {
    let debtors = context.escalations.debtors().await?;
    Ok(Json(debtors))
}

pub async fn list_letter_candidates(
    State(context): State<Arc<AppContext>>,
) -> Result<Json<Vec<LetterCandidate>>, ApiError> {
    let candidates = context.escalations.letter_candidates().await?;
    Ok(Json(candidates))
}

/// The Kaczmarski intake list: letters sent long enough ago, still unpaid.
pub async fn list_collections_candidates(
    State(context): State<Arc<AppContext>>,
) -> Result<Json<Vec<InvoiceRecord>>, ApiError> {
    let candidates = context
        .escalations
        .collections_candidates(Utc::now().date_naive(), COLLECTIONS_MIN_DAYS)
        .await?;
    Ok(Json(candidates))
}
