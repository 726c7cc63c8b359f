//! HTTP routes.
//!
//! Thin JSON handlers over the core services. Everything except `/health`
//! and `/auth/login` sits behind the bearer-token middleware. No business
//! logic lives here; handlers translate between HTTP and service calls.

pub mod escalations;
pub mod invoices;
pub mod session;
pub mod sync;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use dunner_domain::DunnerError;

use crate::context::AppContext;

/// Build the application router.
pub fn router(context: Arc<AppContext>) -> Router {
    let protected = Router::new()
        .route("/sync/run", post(sync::run_sync))
        .route("/debtors", get(escalations::list_debtors))
        .route("/escalations/letters", get(escalations::list_letter_candidates))
        .route("/escalations/collections", get(escalations::list_collections_candidates))
        .route("/clients/{id}/flags", patch(invoices::update_client_flags))
        .route("/invoices/{id}/reminders", post(invoices::send_reminder))
        .route("/invoices/{id}/stop", post(invoices::set_stop))
        .route("/invoices/{id}/letter/sent", post(invoices::letter_sent))
        .route("/invoices/{id}/letter/ignore", post(invoices::letter_ignore))
        .route("/invoices/{id}/letter/restore", post(invoices::letter_restore))
        .route_layer(middleware::from_fn_with_state(context.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(session::login))
        .merge(protected)
        .with_state(context)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bearer-token middleware for the protected routes.
async fn require_auth(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError(DunnerError::Auth("missing bearer token".into())))?;

    context.auth.verify(token).map_err(ApiError)?;
    Ok(next.run(request).await)
}

/// Domain errors mapped onto HTTP responses
pub struct ApiError(pub DunnerError);

impl From<DunnerError> for ApiError {
    fn from(err: DunnerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DunnerError::Auth(_) => StatusCode::UNAUTHORIZED,
            DunnerError::NotFound(_) => StatusCode::NOT_FOUND,
            DunnerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DunnerError::Network(_) | DunnerError::Provider(_) => StatusCode::BAD_GATEWAY,
            DunnerError::Database(_) | DunnerError::Config(_) | DunnerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
