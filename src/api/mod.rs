//! HTTP surface of the dashboard backend.
//!
//! Every handler answers JSON with a `success` flag. Failures carry an
//! `error` message and, for settings validation, a `details` list.

pub mod chrome;
pub mod keywords;
pub mod scraping;
pub mod settings;
pub mod statistics;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::app::SharedState;
use crate::error::ClipperError;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/keywords", get(keywords::list).post(keywords::create))
        .route(
            "/keywords/:id",
            get(keywords::show)
                .put(keywords::update)
                .patch(keywords::patch)
                .delete(keywords::remove),
        )
        .route(
            "/settings",
            get(settings::show)
                .put(settings::update_api)
                .patch(settings::update_section),
        )
        .route("/scraping", get(scraping::status).post(scraping::run))
        .route("/statistics", get(statistics::show))
        .route("/browser-status", get(chrome::browser_status))
        .route("/chrome", get(chrome::status).post(chrome::control))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Wraps any handler error and renders it as a JSON failure envelope.
///
/// The status is derived from the [`ClipperError`] at the root of the
/// chain; anything unrecognized is a 500. `bad_request` pins the status
/// for callers that know better.
pub struct ApiError {
    status: Option<StatusCode>,
    source: anyhow::Error,
}

impl ApiError {
    pub fn bad_request(source: anyhow::Error) -> Self {
        Self {
            status: Some(StatusCode::BAD_REQUEST),
            source,
        }
    }

    fn derived_status(&self) -> StatusCode {
        match self.source.downcast_ref::<ClipperError>() {
            Some(ClipperError::Validation(_)) | Some(ClipperError::InvalidSettings(_)) => {
                StatusCode::BAD_REQUEST
            }
            Some(ClipperError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(source: E) -> Self {
        Self {
            status: None,
            source: source.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or_else(|| self.derived_status());
        let mut body = json!({
            "success": false,
            "error": format!("{:#}", self.source),
        });
        if let Some(ClipperError::InvalidSettings(details)) =
            self.source.downcast_ref::<ClipperError>()
        {
            body["details"] = json!(details);
        }
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.source), "request failed");
        }
        (status, Json(body)).into_response()
    }
}
