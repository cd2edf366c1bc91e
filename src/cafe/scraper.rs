//! Cafe post scraper.
//!
//! Drives the user's already-running Chrome over the DevTools protocol:
//! home page, login check, human-paced search, cafe tab, period filter,
//! then a screenshot per result. All DOM judgment lives in [`probe`];
//! this module owns the tab flow. Everything here blocks, so runs execute
//! under `tokio::task::spawn_blocking`.
//!
//! [`probe`]: super::probe

use crate::cafe::imgur;
use crate::cafe::probe::{CafeEntry, LoginState, NaverSearchProbe, ResultMarker, SearchProbe};
use crate::error::{ClipperError, Result};
use crate::naver::period::NaverDateOption;
use crate::scraping::{pacing, CafePost, ScrapingConfig};
use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const NAVER_HOME: &str = "https://www.naver.com";
const SEARCH_BOX: &str = "#query";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_BOX_TIMEOUT: Duration = Duration::from_secs(10);
const RESULTS_TIMEOUT: Duration = Duration::from_secs(20);
const RESULT_POLL: Duration = Duration::from_millis(500);
const POST_PAGE_TIMEOUT: Duration = Duration::from_secs(100);

pub struct CafeScraper<P: SearchProbe = NaverSearchProbe> {
    browser: Browser,
    probe: P,
    config: ScrapingConfig,
    screenshots_dir: PathBuf,
}

impl CafeScraper<NaverSearchProbe> {
    /// Connects to a Chrome debug websocket, as reported by its
    /// `/json/version` endpoint.
    pub fn connect(ws_url: String, config: ScrapingConfig, screenshots_dir: PathBuf) -> Result<Self> {
        let browser = Browser::connect(ws_url)
            .context("connecting to Chrome debug mode; is Chrome running with remote debugging?")?;
        Ok(Self {
            browser,
            probe: NaverSearchProbe,
            config,
            screenshots_dir,
        })
    }
}

impl<P: SearchProbe> CafeScraper<P> {
    /// Collects up to `max_posts` cafe posts for one keyword. A logged-out
    /// browser, a missing cafe tab, or a result page that never loads is an
    /// error; per-post screenshot and upload problems degrade instead.
    pub fn scrape_posts(
        &self,
        keyword: &str,
        max_posts: usize,
        period: NaverDateOption,
    ) -> Result<Vec<CafePost>> {
        let tab = self.naver_tab()?;

        tab.navigate_to(NAVER_HOME).context("opening the Naver home page")?;
        tab.wait_until_navigated().context("loading the Naver home page")?;
        self.pause();

        let html = tab.get_content().context("reading the Naver home page")?;
        if self.probe.login_state(&html) == LoginState::LoggedOut {
            return Err(ClipperError::Browser(
                "Naver login required. Sign in from the connected browser and retry.".to_string(),
            )
            .into());
        }

        self.run_search(&tab, keyword)?;

        let tab_href = {
            let html = tab.get_content().context("reading the search result page")?;
            self.probe.find_cafe_tab(&html)
        };
        let Some(tab_href) = tab_href else {
            return Err(ClipperError::Browser(
                "cafe tab not found in the search results; the page layout may have changed"
                    .to_string(),
            )
            .into());
        };
        self.open_cafe_tab(&tab, &tab_href)?;

        if self.wait_for_results(&tab)? == ResultMarker::Empty {
            info!("no cafe results for \"{keyword}\"");
            return Ok(Vec::new());
        }

        self.apply_period_filter(&tab, period);

        let entries = {
            let html = tab.get_content().context("reading the cafe result page")?;
            self.probe.extract_results(&html, max_posts)
        };
        info!("found {} cafe posts for \"{keyword}\"", entries.len());

        let mut posts = Vec::with_capacity(entries.len());
        for entry in &entries {
            posts.push(self.capture_post(keyword, entry));
            self.pause();
        }
        Ok(posts)
    }

    /// Reuses a tab already on a Naver page when there is one, otherwise
    /// opens a fresh tab.
    fn naver_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|_| ClipperError::Browser("browser tab registry poisoned".to_string()))?;
        for tab in tabs.iter() {
            if tab.get_url().contains("naver.com") {
                tab.set_default_timeout(NAVIGATION_TIMEOUT);
                return Ok(Arc::clone(tab));
            }
        }
        drop(tabs);
        let tab = self.browser.new_tab().context("opening a tab for Naver")?;
        tab.set_default_timeout(NAVIGATION_TIMEOUT);
        Ok(tab)
    }

    /// Types the keyword the way a person would and submits it.
    fn run_search(&self, tab: &Arc<Tab>, keyword: &str) -> Result<()> {
        let search_box = tab
            .wait_for_element_with_custom_timeout(SEARCH_BOX, SEARCH_BOX_TIMEOUT)
            .context("search box not found on the Naver home page")?;
        search_box.click().context("focusing the search box")?;
        tab.evaluate("document.querySelector('#query').value = ''", false)
            .context("clearing the search box")?;
        for ch in keyword.chars() {
            tab.type_str(ch.encode_utf8(&mut [0u8; 4]))
                .context("typing the keyword")?;
            std::thread::sleep(pacing::typing_delay());
        }
        tab.press_key("Enter").context("submitting the search")?;
        tab.wait_until_navigated().context("waiting for search results")?;
        self.pause();
        Ok(())
    }

    /// Clicks the cafe tab found by the probe, re-dispatching through JS
    /// when the element click fails.
    fn open_cafe_tab(&self, tab: &Arc<Tab>, href: &str) -> Result<()> {
        let selector = format!("a[href=\"{href}\"]");
        let clicked = tab
            .find_element(&selector)
            .and_then(|element| element.click().map(|_| ()));
        if let Err(err) = clicked {
            warn!("cafe tab click failed ({err}); dispatching a JS click");
            let href_literal = serde_json::to_string(href).context("encoding the tab href")?;
            let script = format!(
                "Array.from(document.querySelectorAll('a')).find(a => a.getAttribute('href') === {href_literal}).click()"
            );
            tab.evaluate(&script, false).context("JS click on the cafe tab")?;
        }
        tab.wait_until_navigated().context("loading the cafe tab")?;
        self.pause();
        Ok(())
    }

    /// Polls the page until the probe sees a result marker or the
    /// deadline passes.
    fn wait_for_results(&self, tab: &Arc<Tab>) -> Result<ResultMarker> {
        let deadline = Instant::now() + RESULTS_TIMEOUT;
        loop {
            let html = tab.get_content().context("reading the cafe result page")?;
            if let Some(marker) = self.probe.result_marker(&html) {
                return Ok(marker);
            }
            if Instant::now() >= deadline {
                return Err(ClipperError::Browser(
                    "cafe results did not load within 20s".to_string(),
                )
                .into());
            }
            std::thread::sleep(RESULT_POLL);
        }
    }

    /// Clicks the period filter link for the option. Every failure here
    /// only logs; collection proceeds on the default period.
    fn apply_period_filter(&self, tab: &Arc<Tab>, period: NaverDateOption) {
        let number = period.date_option_number();
        if number <= 0 {
            return;
        }
        let html = match tab.get_content() {
            Ok(html) => html,
            Err(err) => {
                warn!("skipping the period filter: {err}");
                return;
            }
        };
        if self.probe.find_period_link(&html, period).is_none() {
            warn!(
                "no period filter link for {} on the result page; keeping the default period",
                period.as_str()
            );
            return;
        }
        let selector = format!("a[href*=\"date_option={number}\"]");
        let outcome = tab
            .find_element(&selector)
            .and_then(|element| element.click().map(|_| ()))
            .and_then(|_| tab.wait_until_navigated().map(|_| ()));
        match outcome {
            Ok(()) => {
                info!("applied period filter {}", period.as_str());
                self.pause();
            }
            Err(err) => warn!("period filter click failed ({err}); keeping the default period"),
        }
    }

    /// Opens one entry in its own tab and captures it. Screenshot, file,
    /// and upload failures leave those fields empty.
    fn capture_post(&self, keyword: &str, entry: &CafeEntry) -> CafePost {
        let now = Utc::now();
        let mut post = CafePost {
            title: entry.title.clone(),
            content: "스크린샷으로 대체".to_string(),
            author: String::new(),
            post_date: now,
            url: entry.url.clone(),
            cafe_name: entry.cafe_name.clone(),
            keyword: keyword.to_string(),
            screenshot: String::new(),
            screenshot_path: String::new(),
            imgur_url: String::new(),
            scraped_at: now,
        };
        match self.screenshot_entry(entry) {
            Ok(png) => {
                let file_name = screenshot_file_name(keyword, now);
                match self.save_screenshot(&file_name, &png) {
                    Ok(()) => post.screenshot_path = format!("/screenshots/{file_name}"),
                    Err(err) => warn!("saving the screenshot for {} failed: {err}", entry.url),
                }
                let encoded = BASE64.encode(&png);
                if let Some(link) = imgur::upload_screenshot(&encoded) {
                    post.imgur_url = link;
                }
                post.screenshot = encoded;
            }
            Err(err) => warn!("screenshot of {} failed: {err}", entry.url),
        }
        post
    }

    fn screenshot_entry(&self, entry: &CafeEntry) -> Result<Vec<u8>> {
        let tab = self.browser.new_tab().context("opening a tab for the post")?;
        tab.set_default_timeout(POST_PAGE_TIMEOUT);
        let captured = self.capture_on_tab(&tab, entry);
        if let Err(err) = tab.close(true) {
            warn!("closing the post tab failed: {err}");
        }
        captured
    }

    fn capture_on_tab(&self, tab: &Arc<Tab>, entry: &CafeEntry) -> Result<Vec<u8>> {
        tab.navigate_to(&entry.url).context("opening the cafe post")?;
        tab.wait_until_navigated().context("loading the cafe post")?;
        self.pause();
        let clip = page_clip(tab);
        tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, clip, true)
            .context("capturing the post screenshot")
    }

    fn save_screenshot(&self, file_name: &str, png: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.screenshots_dir)
            .with_context(|| format!("creating {}", self.screenshots_dir.display()))?;
        let path = self.screenshots_dir.join(file_name);
        std::fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
        info!("saved screenshot {}", path.display());
        Ok(())
    }

    fn pause(&self) {
        std::thread::sleep(pacing::human_pause(&self.config));
    }
}

/// Measures the document so captures cover the full page height. `None`
/// falls back to a plain viewport capture.
fn page_clip(tab: &Arc<Tab>) -> Option<Page::Viewport> {
    let width = eval_f64(tab, "document.documentElement.scrollWidth")?;
    let height = eval_f64(tab, "document.documentElement.scrollHeight")?;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Page::Viewport {
        x: 0.0,
        y: 0.0,
        width,
        height,
        scale: 1.0,
    })
}

fn eval_f64(tab: &Arc<Tab>, expression: &str) -> Option<f64> {
    tab.evaluate(expression, false).ok()?.value?.as_f64()
}

/// `{keyword}_{timestamp}.png` with the keyword reduced to ASCII
/// alphanumerics and Hangul syllables, and the timestamp made
/// filename-safe.
fn screenshot_file_name(keyword: &str, at: DateTime<Utc>) -> String {
    let clean: String = keyword
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ('가'..='힣').contains(&ch) {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{clean}_{timestamp}.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn screenshot_names_keep_hangul_and_ascii() {
        let at = Utc.with_ymd_and_hms(2025, 3, 2, 9, 30, 5).unwrap();
        let name = screenshot_file_name("갤럭시 S25 후기!", at);
        assert_eq!(name, "갤럭시_S25_후기__2025-03-02T09-30-05-000Z.png");
    }

    #[test]
    fn screenshot_names_replace_all_punctuation() {
        let at = Utc.with_ymd_and_hms(2025, 3, 2, 9, 30, 5).unwrap();
        let name = screenshot_file_name("a/b:c*d", at);
        assert!(name.starts_with("a_b_c_d_"));
        assert!(name.ends_with(".png"));
        assert!(!name[..name.len() - 4].contains(':'));
        assert!(!name[..name.len() - 4].contains('.'));
    }
}
