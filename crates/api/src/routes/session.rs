//! Login route

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::auth::IssuedToken;
use crate::context::AppContext;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

pub async fn login(
    State(context): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<IssuedToken>, ApiError> {
    let issued = context.auth.login(&body.login, &body.password)?;
    Ok(Json(issued))
}
