//! Saving scraped items into the Notion database.
//!
//! Every item goes through a duplicate check, a page create with the
//! Korean property schema the database uses, and, for cafe posts, a
//! best-effort screenshot block append. Writes run strictly one at a
//! time; Notion rejects concurrent writes to the same database with
//! conflict errors, which get a bounded linear-backoff retry.

use crate::error::Result;
use crate::naver::news;
use crate::notion::client::NotionClient;
use crate::scraping::{CafePost, NewsItem};
use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

const MAX_SAVE_ATTEMPTS: u32 = 3;
const CONFLICT_BACKOFF: Duration = Duration::from_millis(1000);
const INTER_WRITE_PAUSE: Duration = Duration::from_millis(200);
/// Notion caps rich_text content at 2000 characters.
const CONTENT_LIMIT: usize = 2000;

/// Outcome of one save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveOutcome {
    fn saved() -> Self {
        Self {
            success: true,
            duplicate: false,
            error: None,
        }
    }

    fn duplicate() -> Self {
        Self {
            success: true,
            duplicate: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            duplicate: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total_news: usize,
    pub total_cafe: usize,
    pub success_news: usize,
    pub success_cafe: usize,
    pub duplicates_news: usize,
    pub duplicates_cafe: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub news_results: Vec<SaveOutcome>,
    pub cafe_results: Vec<SaveOutcome>,
    pub summary: BulkSummary,
}

/// The collection sink. Owns a [`NotionClient`] plus the public base URL
/// local screenshots are reachable under.
pub struct NotionSink {
    client: NotionClient,
    public_base_url: String,
}

impl NotionSink {
    pub fn new(api_key: &str, database_id: &str, public_base_url: &str) -> Result<Self> {
        Ok(Self {
            client: NotionClient::new(api_key, database_id)?,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Database retrieve as a connectivity probe.
    pub async fn test_connection(&self) -> bool {
        self.client.retrieve_database().await.is_ok()
    }

    /// Saves one news item, retrying conflicts.
    pub async fn save_news(&self, item: &NewsItem) -> SaveOutcome {
        self.save_with_retry(&item.title, || self.create_news_page(item))
            .await
    }

    /// Saves one cafe post, retrying conflicts.
    pub async fn save_cafe_post(&self, post: &CafePost) -> SaveOutcome {
        self.save_with_retry(&post.title, || self.create_cafe_page(post))
            .await
    }

    /// Saves everything sequentially, news first, with a short pause
    /// between writes.
    pub async fn save_bulk(&self, news: &[NewsItem], posts: &[CafePost]) -> BulkReport {
        info!(
            "saving {} news items and {} cafe posts to Notion",
            news.len(),
            posts.len()
        );

        let mut news_results = Vec::with_capacity(news.len());
        for (index, item) in news.iter().enumerate() {
            news_results.push(self.save_news(item).await);
            if index + 1 < news.len() {
                tokio::time::sleep(INTER_WRITE_PAUSE).await;
            }
        }

        let mut cafe_results = Vec::with_capacity(posts.len());
        for (index, post) in posts.iter().enumerate() {
            cafe_results.push(self.save_cafe_post(post).await);
            if index + 1 < posts.len() {
                tokio::time::sleep(INTER_WRITE_PAUSE).await;
            }
        }

        let summary = BulkSummary {
            total_news: news.len(),
            total_cafe: posts.len(),
            success_news: count_saved(&news_results),
            success_cafe: count_saved(&cafe_results),
            duplicates_news: count_duplicates(&news_results),
            duplicates_cafe: count_duplicates(&cafe_results),
        };
        info!(
            "Notion save finished: news {}/{} saved ({} duplicates), cafe {}/{} saved ({} duplicates)",
            summary.success_news,
            summary.total_news,
            summary.duplicates_news,
            summary.success_cafe,
            summary.total_cafe,
            summary.duplicates_cafe
        );
        BulkReport {
            news_results,
            cafe_results,
            summary,
        }
    }

    /// Runs one save closure up to three times. Success and duplicate
    /// outcomes return immediately; only conflict errors retry, with
    /// linearly growing backoff.
    async fn save_with_retry<F, Fut>(&self, title: &str, attempt: F) -> SaveOutcome
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<SaveOutcome>>,
    {
        for round in 1..=MAX_SAVE_ATTEMPTS {
            match attempt().await {
                Ok(outcome) => return outcome,
                Err(err) => {
                    let message = format!("{err:#}");
                    if !is_conflict(&message) || round == MAX_SAVE_ATTEMPTS {
                        warn!("saving \"{title}\" failed: {message}");
                        return SaveOutcome::failed(message);
                    }
                    warn!("conflict saving \"{title}\", retrying ({round}/{MAX_SAVE_ATTEMPTS})");
                    tokio::time::sleep(CONFLICT_BACKOFF * round).await;
                }
            }
        }
        SaveOutcome::failed("save attempts exhausted".to_string())
    }

    async fn create_news_page(&self, item: &NewsItem) -> Result<SaveOutcome> {
        if self.is_duplicate(&item.title, &item.link).await {
            info!("duplicate news item skipped: {}", item.title);
            return Ok(SaveOutcome::duplicate());
        }
        let link = if item.originallink.is_empty() {
            &item.link
        } else {
            &item.originallink
        };
        let description: String = item.description.chars().take(CONTENT_LIMIT).collect();
        let published = news::parse_published(&item.pub_date).unwrap_or(item.scraped_at);
        let properties = json!({
            "제목": {"title": [{"text": {"content": item.title}}]},
            "유형": {"select": {"name": "news"}},
            "키워드": {"multi_select": [{"name": item.keyword}]},
            "기사 링크": {"url": link},
            "내용": {"rich_text": [{"text": {"content": description}}]},
            "날짜": {"date": {"start": item.scraped_at.to_rfc3339()}},
            "발행일": {"date": {"start": published.to_rfc3339()}},
        });
        self.client
            .create_page(properties)
            .await
            .context("creating the news page")?;
        info!("saved news item to Notion: {}", item.title);
        Ok(SaveOutcome::saved())
    }

    async fn create_cafe_page(&self, post: &CafePost) -> Result<SaveOutcome> {
        if self.is_duplicate(&post.title, &post.url).await {
            info!("duplicate cafe post skipped: {}", post.title);
            return Ok(SaveOutcome::duplicate());
        }
        let properties = json!({
            "제목": {"title": [{"text": {"content": post.title}}]},
            "유형": {"select": {"name": "cafe"}},
            "키워드": {"multi_select": [{"name": post.keyword}]},
            "카페 링크": {"url": post.url},
            "카페명": {"rich_text": [{"text": {"content": post.cafe_name}}]},
            "내용": {"rich_text": [{"text": {"content": ""}}]},
            "날짜": {"date": {"start": post.scraped_at.to_rfc3339()}},
            "발행일": {"date": {"start": post.post_date.to_rfc3339()}},
        });
        let page = self
            .client
            .create_page(properties)
            .await
            .context("creating the cafe page")?;
        // The page itself is saved at this point; the screenshot section
        // is decoration and must not undo that.
        if let Some(children) = self.screenshot_blocks(post) {
            if let Some(page_id) = page.get("id").and_then(Value::as_str) {
                if let Err(err) = self.client.append_blocks(page_id, children).await {
                    warn!("appending screenshot blocks failed: {err:#}");
                }
            }
        }
        info!("saved cafe post to Notion: {}", post.title);
        Ok(SaveOutcome::saved())
    }

    /// Title or either link already present means duplicate. Query errors
    /// count as "no duplicate".
    async fn is_duplicate(&self, title: &str, url: &str) -> bool {
        let body = json!({
            "filter": {
                "or": [
                    {"property": "제목", "title": {"equals": title}},
                    {"property": "기사 링크", "url": {"equals": url}},
                    {"property": "카페 링크", "url": {"equals": url}},
                ]
            }
        });
        match self.client.query_database(body).await {
            Ok(response) => response
                .get("results")
                .and_then(Value::as_array)
                .is_some_and(|results| !results.is_empty()),
            Err(err) => {
                warn!("duplicate check failed: {err:#}");
                false
            }
        }
    }

    /// Builds the screenshot section: heading, image with caption, image
    /// link paragraph, divider, original post link. `None` when the post
    /// carries no screenshot at all. A post with only base64 bytes still
    /// gets the heading and the original link.
    fn screenshot_blocks(&self, post: &CafePost) -> Option<Value> {
        if post.imgur_url.is_empty() && post.screenshot_path.is_empty() && post.screenshot.is_empty()
        {
            return None;
        }
        let mut children = vec![json!({
            "object": "block",
            "type": "heading_2",
            "heading_2": {"rich_text": [{"type": "text", "text": {"content": "📸 카페글 스크린샷"}}]}
        })];
        if !post.imgur_url.is_empty() {
            children.push(image_block(
                &post.imgur_url,
                &format!("{} - 스크린샷", post.title),
            ));
            children.push(link_paragraph("🔗 이미지 직접 링크: ", &post.imgur_url));
        } else if !post.screenshot_path.is_empty() {
            let local_url = format!("{}{}", self.public_base_url, post.screenshot_path);
            children.push(image_block(
                &local_url,
                &format!("{} - 로컬 스크린샷", post.title),
            ));
            children.push(link_paragraph("📁 로컬 파일: ", &local_url));
        }
        children.push(json!({"object": "block", "type": "divider", "divider": {}}));
        children.push(link_paragraph("🔗 원본 카페글: ", &post.url));
        Some(Value::Array(children))
    }
}

fn image_block(url: &str, caption: &str) -> Value {
    json!({
        "object": "block",
        "type": "image",
        "image": {
            "type": "external",
            "external": {"url": url},
            "caption": [{"type": "text", "text": {"content": caption}}]
        }
    })
}

fn link_paragraph(label: &str, url: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [
                {"type": "text", "text": {"content": label}},
                {"type": "text", "text": {"content": url, "link": {"url": url}}}
            ]
        }
    })
}

/// Notion reports write races with HTTP 409 and a message containing
/// "Conflict occurred".
fn is_conflict(message: &str) -> bool {
    message.contains("Conflict occurred") || message.contains("409")
}

fn count_saved(outcomes: &[SaveOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|outcome| outcome.success && !outcome.duplicate)
        .count()
}

fn count_duplicates(outcomes: &[SaveOutcome]) -> usize {
    outcomes.iter().filter(|outcome| outcome.duplicate).count()
}
