//! Scrape run and readiness handlers.

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use super::ApiResult;
use crate::app::SharedState;
use crate::naver::news::NewsClient;
use crate::notion::NotionSink;
use crate::scraping::{orchestrator, ScrapeRequest};

pub async fn run(
    State(state): State<SharedState>,
    Json(request): Json<ScrapeRequest>,
) -> ApiResult<Json<Value>> {
    let report = orchestrator::run_scrape(&state, request).await?;
    let message = format!(
        "scraping finished: {}/{} keywords",
        report.summary.success_keywords, report.summary.total_keywords
    );
    Ok(Json(json!({
        "success": true,
        "data": report,
        "message": message,
    })))
}

/// Connection readiness for the dashboard. The news and Notion probes run
/// concurrently; live browser state is answered by `GET /browser-status`.
pub async fn status(State(state): State<SharedState>) -> Json<Value> {
    let settings = state.settings.get();
    let news = NewsClient::new(&settings.api);
    let sink = NotionSink::new(
        &settings.api.notion_api_key,
        &settings.api.notion_database_id,
        &state.config.public_base_url,
    );
    let (naver, notion) = match (news, sink) {
        (Ok(news), Ok(sink)) => tokio::join!(news.test_connection(), sink.test_connection()),
        (Ok(news), Err(_)) => (news.test_connection().await, false),
        (Err(_), Ok(sink)) => (false, sink.test_connection().await),
        (Err(_), Err(_)) => (false, false),
    };
    Json(json!({
        "success": true,
        "data": {
            "connections": {
                "naver": naver,
                "notion": notion,
                "browser": false,
            },
            "activeKeywords": state.keywords.list(None, true).len(),
            "lastCheck": Utc::now(),
        }
    }))
}
