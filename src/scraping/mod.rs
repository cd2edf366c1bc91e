//! Scrape run types: collected items, per-run pacing profiles, and the
//! per-keyword/run result shapes returned by the API.

pub mod orchestrator;
pub mod pacing;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One news article returned by the Naver Open API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    /// The publisher's own URL, spelled the way the API spells it.
    pub originallink: String,
    pub link: String,
    /// RFC 2822 timestamp exactly as the API returned it.
    pub pub_date: String,
    pub keyword: String,
    pub source: String,
    pub scraped_at: DateTime<Utc>,
}

/// One cafe post captured from the search results. The body is never
/// extracted; a screenshot stands in for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CafePost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub post_date: DateTime<Utc>,
    pub url: String,
    pub cafe_name: String,
    pub keyword: String,
    /// Base64 PNG of the post page; empty when capture failed.
    pub screenshot: String,
    pub screenshot_path: String,
    pub imgur_url: String,
    pub scraped_at: DateTime<Utc>,
}

/// Pacing profile selector for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    Safe,
    #[default]
    Normal,
    Fast,
    Urgent,
}

/// Millisecond delay bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanPatterns {
    pub enable_mouse_movement: bool,
    pub enable_mistake_pattern: bool,
    pub enable_reading_pattern: bool,
}

/// The knobs one run executes with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingConfig {
    pub mode: ScrapeMode,
    pub delay_between_keywords: DelayRange,
    pub max_items_per_hour: u32,
    pub human_patterns: HumanPatterns,
}

impl ScrapingConfig {
    pub fn for_mode(mode: ScrapeMode) -> Self {
        let delay_between_keywords = match mode {
            ScrapeMode::Safe => DelayRange {
                min: 120_000,
                max: 300_000,
            },
            ScrapeMode::Normal => DelayRange {
                min: 30_000,
                max: 180_000,
            },
            ScrapeMode::Fast => DelayRange { min: 0, max: 0 },
            ScrapeMode::Urgent => DelayRange {
                min: 10_000,
                max: 30_000,
            },
        };
        Self {
            mode,
            delay_between_keywords,
            max_items_per_hour: 20,
            human_patterns: HumanPatterns {
                enable_mouse_movement: true,
                enable_mistake_pattern: true,
                enable_reading_pattern: true,
            },
        }
    }
}

/// Body of `POST /scraping`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeRequest {
    /// Restricts the run to these ids (still only the active ones). Empty
    /// means every active keyword.
    pub keyword_ids: Vec<String>,
    pub mode: ScrapeMode,
    /// Skips the browser, the sink, and pacing; news search still runs.
    pub test_mode: bool,
    pub date_range: Option<f64>,
    /// Overrides the news date window; the cafe period filter still derives
    /// from `date_range`.
    pub custom_range: Option<CustomRange>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Outcome for one keyword.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult {
    pub keyword: String,
    pub news: Vec<NewsItem>,
    pub cafe_posts: Vec<CafePost>,
    pub total_items: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_keywords: usize,
    pub success_keywords: usize,
    pub total_items: usize,
    /// Whole seconds from run start to run end.
    pub duration: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub summary: RunSummary,
    pub results: Vec<ScrapingResult>,
}
