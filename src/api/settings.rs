//! Settings handlers. PUT replaces the API credential section; PATCH
//! updates one named section with the fields it carries, keeping the
//! rest of that section as stored.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiResult};
use crate::app::SharedState;
use crate::error::ClipperError;
use crate::naver::period::NaverDateOption;
use crate::store::settings::ApiSettings;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiBody {
    naver_client_id: Option<String>,
    naver_client_secret: Option<String>,
    notion_api_key: Option<String>,
    notion_database_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionBody {
    #[serde(rename = "type")]
    section: Option<String>,
    news_count: Option<u32>,
    cafe_count: Option<u32>,
    cafe_enabled: Option<bool>,
    scraping_date_range: Option<u32>,
    statistics_date_range: Option<String>,
    custom_start_date: Option<NaiveDate>,
    custom_end_date: Option<NaiveDate>,
    naver_date_option: Option<NaverDateOption>,
}

pub async fn show(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({ "success": true, "data": state.settings.get() }))
}

pub async fn update_api(
    State(state): State<SharedState>,
    Json(body): Json<ApiBody>,
) -> ApiResult<Json<Value>> {
    let api = ApiSettings {
        naver_client_id: body.naver_client_id.unwrap_or_default(),
        naver_client_secret: body.naver_client_secret.unwrap_or_default(),
        notion_api_key: body.notion_api_key.unwrap_or_default(),
        notion_database_id: body.notion_database_id.unwrap_or_default(),
    };
    let saved = state.settings.update_api(api)?;
    Ok(Json(json!({
        "success": true,
        "data": saved,
        "message": "API settings saved",
    })))
}

pub async fn update_section(
    State(state): State<SharedState>,
    Json(body): Json<SectionBody>,
) -> ApiResult<Json<Value>> {
    match body.section.as_deref() {
        Some("scraping") => {
            let current = state.settings.get().scraping;
            let saved = state.settings.update_scraping(
                body.news_count.unwrap_or(current.news_count),
                body.cafe_count.unwrap_or(current.cafe_count),
                body.cafe_enabled.unwrap_or(current.cafe_enabled),
            )?;
            Ok(Json(json!({
                "success": true,
                "data": saved,
                "message": "scraping settings updated",
            })))
        }
        Some("period") => {
            let current = state.settings.get().period;
            let period = crate::store::settings::PeriodSettings {
                scraping_date_range: body
                    .scraping_date_range
                    .unwrap_or(current.scraping_date_range),
                statistics_date_range: body
                    .statistics_date_range
                    .unwrap_or(current.statistics_date_range),
                custom_start_date: body.custom_start_date.or(current.custom_start_date),
                custom_end_date: body.custom_end_date.or(current.custom_end_date),
                naver_date_option: body.naver_date_option.unwrap_or(current.naver_date_option),
            };
            let saved = state.settings.update_period(period)?;
            Ok(Json(json!({
                "success": true,
                "data": saved,
                "message": "period settings updated",
            })))
        }
        other => Err(ApiError::from(ClipperError::Validation(format!(
            "unsupported settings type: {}",
            other.unwrap_or("none")
        )))),
    }
}
