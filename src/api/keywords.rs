//! Keyword CRUD handlers. All persistence rules live in
//! [`KeywordStore`]; these functions only shape requests and envelopes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiResult};
use crate::app::SharedState;
use crate::error::ClipperError;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
    active: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordBody {
    term: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchBody {
    action: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let active_only = query.active.as_deref() == Some("true");
    let keywords = state.keywords.list(query.q.as_deref(), active_only);
    Json(json!({
        "success": true,
        "data": keywords,
        "statistics": state.keywords.statistics(),
        "settings": state.keywords.settings(),
    }))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(body): Json<KeywordBody>,
) -> ApiResult<Json<Value>> {
    let term = body.term.unwrap_or_default();
    let category = body.category.unwrap_or_default();
    let keyword = state.keywords.add(&term, &category)?;
    let message = format!("keyword \"{}\" added", keyword.term);
    Ok(Json(json!({
        "success": true,
        "data": keyword,
        "message": message,
    })))
}

pub async fn show(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let keyword = state.keywords.get(&id)?;
    Ok(Json(json!({ "success": true, "data": keyword })))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<KeywordBody>,
) -> ApiResult<Json<Value>> {
    let keyword = state
        .keywords
        .update(&id, body.term.as_deref(), body.category.as_deref())?;
    let message = format!("keyword \"{}\" updated", keyword.term);
    Ok(Json(json!({
        "success": true,
        "data": keyword,
        "message": message,
    })))
}

pub async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.keywords.remove(&id)?;
    Ok(Json(json!({ "success": true, "message": "keyword deleted" })))
}

/// PATCH drives state flips. `toggle` is the only action today.
pub async fn patch(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<PatchBody>,
) -> ApiResult<Json<Value>> {
    match body.action.as_deref() {
        Some("toggle") => {
            let keyword = state.keywords.toggle(&id)?;
            let message = format!(
                "keyword \"{}\" {}",
                keyword.term,
                if keyword.active { "activated" } else { "deactivated" }
            );
            Ok(Json(json!({
                "success": true,
                "data": keyword,
                "message": message,
            })))
        }
        other => Err(ApiError::from(ClipperError::Validation(format!(
            "unsupported action: {}",
            other.unwrap_or("none")
        )))),
    }
}
