//! Naver Open API news search client.
//!
//! API docs: https://developers.naver.com/docs/serviceapi/search/news/news.md
//! The API has no date filter, so results are re-filtered client-side
//! against the requested window using each item's `pubDate`.

use crate::error::{ClipperError, Result};
use crate::scraping::NewsItem;
use crate::store::settings::ApiSettings;
use anyhow::Context;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::info;

const NEWS_ENDPOINT: &str = "https://openapi.naver.com/v1/search/news.json";

#[derive(Debug, Deserialize)]
struct NewsSearchResponse {
    #[serde(rename = "lastBuildDate")]
    #[allow(dead_code)]
    last_build_date: Option<String>,
    #[allow(dead_code)]
    total: Option<u64>,
    #[allow(dead_code)]
    display: Option<u32>,
    items: Vec<RawNewsItem>,
}

#[derive(Debug, Deserialize)]
struct RawNewsItem {
    title: String,
    originallink: String,
    link: String,
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

#[derive(Debug)]
pub struct NewsClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl NewsClient {
    pub fn new(api: &ApiSettings) -> Result<Self> {
        if api.naver_client_id.is_empty() || api.naver_client_secret.is_empty() {
            return Err(ClipperError::Naver(
                "Naver API credentials are not configured".to_string(),
            )
            .into());
        }
        let client = reqwest::Client::builder()
            .user_agent("clipper/0.1")
            .build()
            .context("building Naver API client")?;
        Ok(Self {
            client,
            client_id: api.naver_client_id.clone(),
            client_secret: api.naver_client_secret.clone(),
        })
    }

    /// Searches recent news for a keyword, keeping only items published
    /// inside `[from, to]`. Items whose `pubDate` does not parse are
    /// dropped.
    pub async fn search(
        &self,
        keyword: &str,
        count: u32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<NewsItem>> {
        let display = count.min(100).to_string();
        let response = self
            .client
            .get(NEWS_ENDPOINT)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[
                ("query", keyword),
                ("display", display.as_str()),
                ("start", "1"),
                ("sort", "date"),
            ])
            .send()
            .await
            .with_context(|| format!("news search failed for \"{keyword}\""))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "news search failed for \"{keyword}\": Naver API returned {}",
                response.status()
            );
        }

        let parsed: NewsSearchResponse = response
            .json()
            .await
            .with_context(|| format!("decoding news response for \"{keyword}\""))?;

        let tag_pattern = Regex::new(r"<[^>]*>").context("compiling tag pattern")?;
        let scraped_at = Utc::now();
        let items: Vec<NewsItem> = parsed
            .items
            .into_iter()
            .filter_map(|raw| {
                let published = parse_published(&raw.pub_date)?;
                if published < from || published > to {
                    return None;
                }
                Some(NewsItem {
                    title: strip_html(&tag_pattern, &raw.title),
                    description: strip_html(&tag_pattern, &raw.description),
                    originallink: raw.originallink,
                    link: raw.link,
                    pub_date: raw.pub_date,
                    keyword: keyword.to_string(),
                    source: "naver_news".to_string(),
                    scraped_at,
                })
            })
            .collect();
        info!(
            "news search for \"{}\" kept {} items in the window",
            keyword,
            items.len()
        );
        Ok(items)
    }

    /// A minimal one-item search proving the credentials work.
    pub async fn test_connection(&self) -> bool {
        let to = Utc::now();
        let from = to - chrono::Duration::days(1);
        self.search("테스트", 1, from, to).await.is_ok()
    }
}

/// Parses the RFC 2822 timestamps the news API emits. The sink reuses this
/// for the published-date property.
pub(crate) fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Strips the markup Naver embeds in excerpt fields: tags first, then the
/// entities the API emits.
fn strip_html(tags: &Regex, input: &str) -> String {
    tags.replace_all(input, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_pattern() -> Regex {
        Regex::new(r"<[^>]*>").unwrap()
    }

    #[test]
    fn strip_html_removes_tags_and_entities() {
        let tags = tag_pattern();
        assert_eq!(
            strip_html(&tags, "<b>삼성전자</b> 실적 발표"),
            "삼성전자 실적 발표"
        );
        assert_eq!(
            strip_html(&tags, "A &lt;B&gt; &amp; C &quot;D&quot; &#39;E&#39;"),
            "A <B> & C \"D\" 'E'"
        );
        assert_eq!(strip_html(&tags, "  plain  "), "plain");
        assert_eq!(
            strip_html(&tags, "<a href=\"x\">link</a> text"),
            "link text"
        );
    }

    #[test]
    fn pub_dates_parse_as_rfc_2822() {
        let parsed = parse_published("Mon, 26 Sep 2016 07:50:00 +0900").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-09-25T22:50:00+00:00");
        assert!(parse_published("2016-09-26").is_none());
        assert!(parse_published("").is_none());
    }

    #[test]
    fn client_requires_credentials() {
        let api = ApiSettings {
            naver_client_id: String::new(),
            naver_client_secret: String::new(),
            notion_api_key: String::new(),
            notion_database_id: String::new(),
        };
        let err = NewsClient::new(&api).unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    fn should_skip_online_tests() -> bool {
        std::env::var("CLIPPER_SKIP_ONLINE_TESTS")
            .map(|v| v != "0")
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn online_news_search_returns_windowed_items() {
        if should_skip_online_tests() {
            return;
        }
        let api = ApiSettings::default();
        let client = match NewsClient::new(&api) {
            Ok(client) => client,
            Err(err) => {
                eprintln!("Skipping online news test: {err}");
                return;
            }
        };
        let to = Utc::now();
        let from = to - chrono::Duration::days(30);
        match client.search("뉴스", 5, from, to).await {
            Ok(items) => {
                assert!(items.len() <= 5);
                for item in items {
                    assert_eq!(item.source, "naver_news");
                    assert!(!item.title.contains("<b>"));
                }
            }
            Err(err) => eprintln!("Skipping online news test: {err}"),
        }
    }
}
