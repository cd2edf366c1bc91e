//! Collection statistics handler, backed by the Notion database.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, ApiResult};
use crate::app::SharedState;
use crate::error::ClipperError;
use crate::notion::{stats, NotionClient, NotionStatistics};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsQuery {
    period: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

pub async fn show(
    State(state): State<SharedState>,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Response> {
    let period_type = query.period.unwrap_or_else(|| "week".to_string());
    let settings = state.settings.get();
    if settings.api.notion_api_key.trim().is_empty()
        || settings.api.notion_database_id.trim().is_empty()
    {
        return Err(ApiError::from(ClipperError::Validation(
            "Notion settings are required for statistics".to_string(),
        )));
    }

    let client = match NotionClient::new(
        &settings.api.notion_api_key,
        &settings.api.notion_database_id,
    ) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "statistics unavailable");
            let body = json!({
                "success": false,
                "error": format!("{err:#}"),
                "statistics": NotionStatistics::default(),
                "recentActivity": [],
            });
            return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
        }
    };

    let statistics = stats::collect(&client, &period_type, query.start_date, query.end_date).await;
    let recent_activity = stats::recent_activity(&client, 5).await;

    let body = json!({
        "success": true,
        "statistics": statistics,
        "recentActivity": recent_activity,
        "period": {
            "type": period_type,
            "startDate": query.start_date,
            "endDate": query.end_date,
        },
    });
    Ok(Json(body).into_response())
}
