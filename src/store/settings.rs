//! Application settings store.
//!
//! Settings live in `{data_dir}/settings.json`, split into sections (api,
//! chrome, period, scraping). Deserialization defaults every missing field
//! and section, so older or partially written files self-heal on load and a
//! missing file yields pure defaults. Integration secrets default from the
//! environment on first use.

use crate::error::{ClipperError, Result};
use crate::naver::period::NaverDateOption;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    pub naver_client_id: String,
    pub naver_client_secret: String,
    pub notion_api_key: String,
    pub notion_database_id: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            naver_client_id: env_or_empty("NAVER_CLIENT_ID"),
            naver_client_secret: env_or_empty("NAVER_CLIENT_SECRET"),
            notion_api_key: env_or_empty("NOTION_API_KEY"),
            notion_database_id: env_or_empty("NOTION_DATABASE_ID"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChromeSettings {
    pub debug_port: u16,
    pub debug_host: String,
    pub user_data_dir: String,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            debug_port: std::env::var("CHROME_DEBUG_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9222),
            debug_host: std::env::var("CHROME_DEBUG_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            user_data_dir: "/tmp/chrome-debug".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodSettings {
    /// Days of history a scrape run covers.
    pub scraping_date_range: u32,
    /// "week", "month" or "custom"; passed through to statistics queries.
    pub statistics_date_range: String,
    pub custom_start_date: Option<NaiveDate>,
    pub custom_end_date: Option<NaiveDate>,
    /// Period option applied on Naver search result pages when a run does
    /// not carry its own day range.
    pub naver_date_option: NaverDateOption,
}

impl Default for PeriodSettings {
    fn default() -> Self {
        Self {
            scraping_date_range: 7,
            statistics_date_range: "week".to_string(),
            custom_start_date: None,
            custom_end_date: None,
            naver_date_option: NaverDateOption::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapingSettings {
    pub news_count: u32,
    pub cafe_count: u32,
    pub cafe_enabled: bool,
}

impl Default for ScrapingSettings {
    fn default() -> Self {
        Self {
            news_count: 10,
            cafe_count: 5,
            cafe_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub chrome: ChromeSettings,
    pub period: PeriodSettings,
    pub scraping: ScrapingSettings,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            chrome: ChromeSettings::default(),
            period: PeriodSettings::default(),
            scraping: ScrapingSettings::default(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("settings.json"),
        }
    }

    pub fn get(&self) -> AppSettings {
        super::read_json(&self.path).unwrap_or_default()
    }

    fn save(&self, settings: &mut AppSettings) -> Result<()> {
        settings.updated_at = Some(Utc::now());
        super::write_json(&self.path, settings)
    }

    /// Replaces the API credentials. All four fields are required; every
    /// missing one is reported, not just the first.
    pub fn update_api(&self, api: ApiSettings) -> Result<ApiSettings> {
        let api = ApiSettings {
            naver_client_id: api.naver_client_id.trim().to_string(),
            naver_client_secret: api.naver_client_secret.trim().to_string(),
            notion_api_key: api.notion_api_key.trim().to_string(),
            notion_database_id: api.notion_database_id.trim().to_string(),
        };
        let errors = validate_api(&api);
        if !errors.is_empty() {
            return Err(ClipperError::InvalidSettings(errors).into());
        }
        let mut settings = self.get();
        settings.api = api.clone();
        self.save(&mut settings)?;
        Ok(api)
    }

    pub fn update_scraping(
        &self,
        news_count: u32,
        cafe_count: u32,
        cafe_enabled: bool,
    ) -> Result<ScrapingSettings> {
        if !(1..=100).contains(&news_count) {
            return Err(ClipperError::Validation(
                "news count must be between 1 and 100".to_string(),
            )
            .into());
        }
        if !(1..=50).contains(&cafe_count) {
            return Err(
                ClipperError::Validation("cafe count must be between 1 and 50".to_string()).into(),
            );
        }
        let mut settings = self.get();
        settings.scraping = ScrapingSettings {
            news_count,
            cafe_count,
            cafe_enabled,
        };
        let scraping = settings.scraping.clone();
        self.save(&mut settings)?;
        Ok(scraping)
    }

    pub fn update_period(&self, period: PeriodSettings) -> Result<PeriodSettings> {
        validate_period(&period)?;
        let mut settings = self.get();
        settings.period = period.clone();
        self.save(&mut settings)?;
        Ok(period)
    }
}

fn validate_api(api: &ApiSettings) -> Vec<String> {
    let mut errors = Vec::new();
    if api.naver_client_id.is_empty() {
        errors.push("Naver client id is missing".to_string());
    }
    if api.naver_client_secret.is_empty() {
        errors.push("Naver client secret is missing".to_string());
    }
    if api.notion_api_key.is_empty() {
        errors.push("Notion API key is missing".to_string());
    }
    if api.notion_database_id.is_empty() {
        errors.push("Notion database id is missing".to_string());
    }
    errors
}

fn validate_period(period: &PeriodSettings) -> Result<()> {
    if !(1..=365).contains(&period.scraping_date_range) {
        return Err(ClipperError::Validation(
            "scraping date range must be between 1 and 365 days".to_string(),
        )
        .into());
    }
    if period.statistics_date_range == "custom" {
        match (period.custom_start_date, period.custom_end_date) {
            (Some(start), Some(end)) => {
                if start >= end {
                    return Err(ClipperError::Validation(
                        "custom period start must be before its end".to_string(),
                    )
                    .into());
                }
            }
            _ => {
                return Err(ClipperError::Validation(
                    "custom period requires both start and end dates".to_string(),
                )
                .into());
            }
        }
    }
    Ok(())
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        (dir, store)
    }

    fn valid_api() -> ApiSettings {
        ApiSettings {
            naver_client_id: "id".to_string(),
            naver_client_secret: "secret".to_string(),
            notion_api_key: "ntn_key".to_string(),
            notion_database_id: "db".to_string(),
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (_dir, store) = store();
        let settings = store.get();
        assert_eq!(settings.scraping.news_count, 10);
        assert_eq!(settings.scraping.cafe_count, 5);
        assert!(settings.scraping.cafe_enabled);
        assert_eq!(settings.period.scraping_date_range, 7);
        assert_eq!(settings.period.statistics_date_range, "week");
        assert!(settings.updated_at.is_none());
    }

    #[test]
    fn partial_file_merges_section_by_section() {
        let (dir, store) = store();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"scraping": {"newsCount": 42}, "period": {"naverDateOption": "1w"}}"#,
        )
        .unwrap();
        let settings = store.get();
        assert_eq!(settings.scraping.news_count, 42);
        assert_eq!(settings.scraping.cafe_count, 5);
        assert_eq!(settings.period.naver_date_option, NaverDateOption::OneWeek);
        assert_eq!(settings.period.scraping_date_range, 7);
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("settings.json"), "]]").unwrap();
        assert_eq!(store.get().scraping.news_count, 10);
    }

    #[test]
    fn update_api_reports_every_missing_field() {
        let (_dir, store) = store();
        let err = store
            .update_api(ApiSettings {
                naver_client_id: "  ".to_string(),
                naver_client_secret: String::new(),
                notion_api_key: "key".to_string(),
                notion_database_id: String::new(),
            })
            .unwrap_err();
        match err.downcast_ref::<ClipperError>() {
            Some(ClipperError::InvalidSettings(details)) => {
                assert_eq!(details.len(), 3);
                assert!(details.iter().any(|d| d.contains("client id")));
                assert!(details.iter().any(|d| d.contains("client secret")));
                assert!(details.iter().any(|d| d.contains("database id")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn update_api_trims_and_persists() {
        let (_dir, store) = store();
        let saved = store
            .update_api(ApiSettings {
                naver_client_id: " id ".to_string(),
                naver_client_secret: "secret".to_string(),
                notion_api_key: "key".to_string(),
                notion_database_id: "db".to_string(),
            })
            .unwrap();
        assert_eq!(saved.naver_client_id, "id");
        let settings = store.get();
        assert_eq!(settings.api.naver_client_id, "id");
        assert!(settings.updated_at.is_some());
    }

    #[test]
    fn update_scraping_enforces_bounds() {
        let (_dir, store) = store();
        assert!(store.update_scraping(0, 5, true).is_err());
        assert!(store.update_scraping(101, 5, true).is_err());
        assert!(store.update_scraping(10, 0, true).is_err());
        assert!(store.update_scraping(10, 51, true).is_err());

        let saved = store.update_scraping(20, 3, false).unwrap();
        assert_eq!(saved.news_count, 20);
        assert_eq!(store.get().scraping.cafe_count, 3);
        assert!(!store.get().scraping.cafe_enabled);
    }

    #[test]
    fn update_period_validates_range_and_custom_dates() {
        let (_dir, store) = store();
        let mut period = PeriodSettings::default();
        period.scraping_date_range = 0;
        assert!(store.update_period(period.clone()).is_err());
        period.scraping_date_range = 366;
        assert!(store.update_period(period.clone()).is_err());

        period.scraping_date_range = 30;
        period.statistics_date_range = "custom".to_string();
        assert!(store.update_period(period.clone()).is_err());

        period.custom_start_date = NaiveDate::from_ymd_opt(2025, 3, 10);
        period.custom_end_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert!(store.update_period(period.clone()).is_err());

        period.custom_end_date = NaiveDate::from_ymd_opt(2025, 3, 20);
        let saved = store.update_period(period).unwrap();
        assert_eq!(saved.scraping_date_range, 30);
        assert_eq!(store.get().period.statistics_date_range, "custom");
    }

    #[test]
    fn api_update_keeps_other_sections() {
        let (_dir, store) = store();
        store.update_scraping(33, 4, true).unwrap();
        store.update_api(valid_api()).unwrap();
        let settings = store.get();
        assert_eq!(settings.scraping.news_count, 33);
        assert_eq!(settings.api.notion_api_key, "ntn_key");
    }
}
