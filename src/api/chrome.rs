//! Chrome lifecycle and browser reachability handlers.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiResult};
use crate::app::SharedState;
use crate::chrome::cdp;
use crate::error::ClipperError;

#[derive(Debug, Default, Deserialize)]
pub struct ControlBody {
    action: Option<String>,
}

pub async fn status(State(state): State<SharedState>) -> Json<Value> {
    let port = state.settings.get().chrome.debug_port;
    let status = state.chrome.status(port).await;
    Json(json!({ "success": true, "data": status }))
}

pub async fn control(
    State(state): State<SharedState>,
    Json(body): Json<ControlBody>,
) -> ApiResult<Json<Value>> {
    let port = state.settings.get().chrome.debug_port;
    match body.action.as_deref() {
        Some("start") => {
            let details = state.chrome.start(port).await.map_err(ApiError::bad_request)?;
            Ok(Json(json!({
                "success": true,
                "message": "Chrome started in debug mode",
                "data": details,
            })))
        }
        Some("stop") => {
            state.chrome.stop(port).await.map_err(ApiError::bad_request)?;
            Ok(Json(json!({
                "success": true,
                "message": "Chrome stopped",
            })))
        }
        _ => Err(ApiError::from(ClipperError::Validation(
            "action must be \"start\" or \"stop\"".to_string(),
        ))),
    }
}

/// Always answers 200; unreachable Chrome is a state, not a failure.
pub async fn browser_status(State(state): State<SharedState>) -> Json<Value> {
    let chrome = state.settings.get().chrome;
    match cdp::fetch_version(&chrome.debug_host, chrome.debug_port).await {
        Ok(version) => {
            let tabs = cdp::list_tabs(&chrome.debug_host, chrome.debug_port)
                .await
                .unwrap_or_default();
            let naver_logged_in = cdp::naver_login_from_tabs(&tabs);
            Json(json!({
                "success": true,
                "data": {
                    "chromeConnected": true,
                    "naverLoggedIn": naver_logged_in,
                    "portOpen": true,
                    "chromeVersion": version.user_agent.as_deref().unwrap_or("unknown"),
                    "debugPort": chrome.debug_port,
                }
            }))
        }
        Err(err) => Json(json!({
            "success": true,
            "data": {
                "chromeConnected": false,
                "naverLoggedIn": false,
                "portOpen": false,
                "error": format!("{err:#}"),
            }
        })),
    }
}
