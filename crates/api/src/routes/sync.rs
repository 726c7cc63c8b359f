//! Sync trigger route

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use dunner_core::SyncReport;

use super::ApiError;
use crate::context::AppContext;

pub async fn run_sync(
    State(context): State<Arc<AppContext>>,
) -> Result<Json<SyncReport>, ApiError> {
    let report = context.sync.run(Utc::now()).await?;
    Ok(Json(report))
}
