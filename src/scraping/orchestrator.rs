//! The scrape run itself.
//!
//! Keywords run strictly one after another; per keyword the order is news
//! search, cafe collection, Notion save. One keyword failing never aborts
//! the run: its entry carries `success: false` and whatever was collected
//! before the failure. Cafe work blocks on the browser, so it runs on the
//! blocking thread pool.

use crate::app::AppState;
use crate::cafe::CafeScraper;
use crate::chrome::cdp;
use crate::error::{ClipperError, Result};
use crate::naver::news::NewsClient;
use crate::naver::period::NaverDateOption;
use crate::notion::NotionSink;
use crate::scraping::{
    pacing, CafePost, NewsItem, RunReport, RunSummary, ScrapeRequest, ScrapingConfig,
    ScrapingResult,
};
use crate::store::keywords::Keyword;
use crate::store::settings::{AppSettings, ChromeSettings};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_DATE_RANGE_DAYS: f64 = 7.0;

/// How the cafe stage runs for this particular request.
enum CafeStage {
    /// Connected to the user's Chrome.
    Ready(Arc<CafeScraper>),
    /// Connecting failed; every keyword's cafe stage fails with this.
    Unavailable(String),
    /// Test mode or cafe scraping disabled in settings.
    Skipped,
}

/// Runs one scrape over the selected keywords and reports per-keyword
/// results plus a run summary.
pub async fn run_scrape(state: &AppState, request: ScrapeRequest) -> Result<RunReport> {
    let run_start = Utc::now();
    let keywords = select_keywords(state, &request)?;
    let settings = state.settings.get();
    let config = ScrapingConfig::for_mode(request.mode);

    info!(
        "starting scrape: {} keywords, mode {:?}, test_mode {}",
        keywords.len(),
        request.mode,
        request.test_mode
    );

    let news_client = NewsClient::new(&settings.api);
    let (from, to) = news_window(&request);
    let period = cafe_period(&request, &settings);

    let cafe = if request.test_mode || !settings.scraping.cafe_enabled {
        CafeStage::Skipped
    } else {
        match connect_cafe(state, &settings.chrome, &config).await {
            Ok(scraper) => CafeStage::Ready(Arc::new(scraper)),
            Err(err) => {
                warn!("cafe stage unavailable: {err:#}");
                CafeStage::Unavailable(format!("cafe scraping unavailable: {err:#}"))
            }
        }
    };

    let sink = if request.test_mode {
        None
    } else {
        Some(NotionSink::new(
            &settings.api.notion_api_key,
            &settings.api.notion_database_id,
            &state.config.public_base_url,
        )?)
    };

    let mut results = Vec::with_capacity(keywords.len());
    for (index, keyword) in keywords.iter().enumerate() {
        let start_time = Utc::now();
        let mut news_items: Vec<NewsItem> = Vec::new();
        let mut cafe_posts: Vec<CafePost> = Vec::new();
        let mut failure: Option<String> = None;

        match &news_client {
            Ok(client) => {
                match client
                    .search(&keyword.term, settings.scraping.news_count, from, to)
                    .await
                {
                    Ok(items) => news_items = items,
                    Err(err) => failure = Some(format!("news search failed: {err:#}")),
                }
            }
            Err(err) => failure = Some(format!("news search failed: {err:#}")),
        }

        // A news failure skips the cafe stage; a cafe failure keeps the
        // news already collected.
        if failure.is_none() {
            match &cafe {
                CafeStage::Ready(scraper) => {
                    let scraper = Arc::clone(scraper);
                    let term = keyword.term.clone();
                    let limit = settings.scraping.cafe_count as usize;
                    let joined = tokio::task::spawn_blocking(move || {
                        scraper.scrape_posts(&term, limit, period)
                    })
                    .await;
                    match joined {
                        Ok(Ok(posts)) => cafe_posts = posts,
                        Ok(Err(err)) => {
                            failure = Some(format!("cafe scraping failed: {err:#}"))
                        }
                        Err(err) => failure = Some(format!("cafe scraping task failed: {err}")),
                    }
                }
                CafeStage::Unavailable(message) => failure = Some(message.clone()),
                CafeStage::Skipped => {}
            }
        }

        if let Some(sink) = &sink {
            if !news_items.is_empty() || !cafe_posts.is_empty() {
                sink.save_bulk(&news_items, &cafe_posts).await;
            }
        }

        let result = keyword_outcome(&keyword.term, news_items, cafe_posts, failure, start_time);
        info!(
            "keyword \"{}\": {} items, success {}",
            keyword.term, result.total_items, result.success
        );
        results.push(result);

        if !request.test_mode && index + 1 < keywords.len() {
            let delay = pacing::keyword_delay(&config);
            if !delay.is_zero() {
                info!("pausing {}s before the next keyword", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }
    }

    let end_time = Utc::now();
    let summary = RunSummary {
        total_keywords: results.len(),
        success_keywords: results.iter().filter(|result| result.success).count(),
        total_items: results.iter().map(|result| result.total_items).sum(),
        duration: (end_time - run_start).num_seconds(),
        start_time: run_start,
        end_time,
    };
    info!(
        "scrape finished: {}/{} keywords succeeded, {} items in {}s",
        summary.success_keywords, summary.total_keywords, summary.total_items, summary.duration
    );
    Ok(RunReport { summary, results })
}

/// Active keywords, narrowed to the requested ids when any were given.
/// Nothing selectable is a validation error.
fn select_keywords(state: &AppState, request: &ScrapeRequest) -> Result<Vec<Keyword>> {
    let active = state.keywords.list(None, true);
    let selected: Vec<Keyword> = if request.keyword_ids.is_empty() {
        active
    } else {
        active
            .into_iter()
            .filter(|keyword| request.keyword_ids.contains(&keyword.id))
            .collect()
    };
    if selected.is_empty() {
        return Err(ClipperError::Validation(
            "no active keywords selected for scraping".to_string(),
        )
        .into());
    }
    Ok(selected)
}

/// The news window: the custom range when one was sent, otherwise the last
/// `date_range` days (default 7) ending now.
fn news_window(request: &ScrapeRequest) -> (DateTime<Utc>, DateTime<Utc>) {
    if let Some(range) = request.custom_range {
        let from = range.start_date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let to = range
            .end_date
            .and_hms_opt(23, 59, 59)
            .unwrap_or_default()
            .and_utc();
        return (from, to);
    }
    let days = request.date_range.unwrap_or(DEFAULT_DATE_RANGE_DAYS);
    let to = Utc::now();
    let from = to - Duration::milliseconds((days * 86_400_000.0) as i64);
    (from, to)
}

/// The cafe period filter: derived from the run's day range when one was
/// sent, otherwise the period configured in settings.
fn cafe_period(request: &ScrapeRequest, settings: &AppSettings) -> NaverDateOption {
    match request.date_range {
        Some(days) => NaverDateOption::from_day_range(days),
        None => settings.period.naver_date_option,
    }
}

/// Resolves the debug websocket and connects on the blocking pool.
async fn connect_cafe(
    state: &AppState,
    chrome: &ChromeSettings,
    config: &ScrapingConfig,
) -> Result<CafeScraper> {
    let version = cdp::fetch_version(&chrome.debug_host, chrome.debug_port).await?;
    let ws_url = version.web_socket_debugger_url.ok_or_else(|| {
        ClipperError::Browser("Chrome did not report a websocket debugger URL".to_string())
    })?;
    let scraping_config = config.clone();
    let screenshots_dir = state.config.screenshots_dir.clone();
    let scraper = tokio::task::spawn_blocking(move || {
        CafeScraper::connect(ws_url, scraping_config, screenshots_dir)
    })
    .await
    .context("joining the Chrome connect task")??;
    Ok(scraper)
}

fn keyword_outcome(
    term: &str,
    news: Vec<NewsItem>,
    cafe_posts: Vec<CafePost>,
    failure: Option<String>,
    start_time: DateTime<Utc>,
) -> ScrapingResult {
    let total_items = news.len() + cafe_posts.len();
    ScrapingResult {
        keyword: term.to_string(),
        news,
        cafe_posts,
        total_items,
        start_time,
        end_time: Utc::now(),
        success: failure.is_none(),
        error: failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::CustomRange;
    use chrono::NaiveDate;

    #[test]
    fn keyword_outcome_counts_both_collections() {
        let start = Utc::now();
        let result = keyword_outcome("갤럭시", Vec::new(), Vec::new(), None, start);
        assert!(result.success);
        assert_eq!(result.total_items, 0);
        assert!(result.error.is_none());

        let failed = keyword_outcome(
            "갤럭시",
            Vec::new(),
            Vec::new(),
            Some("cafe scraping failed: login required".to_string()),
            start,
        );
        assert!(!failed.success);
        assert_eq!(
            failed.error.as_deref(),
            Some("cafe scraping failed: login required")
        );
    }

    #[test]
    fn news_window_defaults_to_a_week_back() {
        let request = ScrapeRequest::default();
        let (from, to) = news_window(&request);
        let days = (to - from).num_days();
        assert_eq!(days, 7);
    }

    #[test]
    fn news_window_supports_fractional_days() {
        let request = ScrapeRequest {
            date_range: Some(0.5),
            ..Default::default()
        };
        let (from, to) = news_window(&request);
        assert_eq!((to - from).num_hours(), 12);
    }

    #[test]
    fn custom_range_overrides_the_window() {
        let request = ScrapeRequest {
            date_range: Some(30.0),
            custom_range: Some(CustomRange {
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            }),
            ..Default::default()
        };
        let (from, to) = news_window(&request);
        assert_eq!(from.to_rfc3339(), "2025-03-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2025-03-10T23:59:59+00:00");
    }

    #[test]
    fn cafe_period_prefers_the_request_range() {
        let settings = AppSettings::default();
        let request = ScrapeRequest {
            date_range: Some(10.0),
            ..Default::default()
        };
        assert_eq!(cafe_period(&request, &settings), NaverDateOption::OneWeek);
        // Without a range the configured option applies.
        assert_eq!(
            cafe_period(&ScrapeRequest::default(), &settings),
            settings.period.naver_date_option
        );
    }
}
