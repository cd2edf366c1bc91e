//! Dashboard statistics read back out of the Notion database.

use crate::error::Result;
use crate::notion::client::NotionClient;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

const PAGE_SIZE: u32 = 100;

/// Collection counts for the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionStatistics {
    pub total_collected: usize,
    pub today_collected: usize,
    pub this_week_collected: usize,
    pub this_month_collected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_period_collected: Option<usize>,
}

/// One recently collected entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub title: String,
    pub category: String,
    pub keyword: String,
    pub collected_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: String,
}

/// Counts the whole database plus the today/week/month windows, and the
/// custom window when asked for one. The total failing zeroes everything;
/// any other window failing degrades to a zero for that window only.
pub async fn collect(
    client: &NotionClient,
    period_type: &str,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
) -> NotionStatistics {
    let today = Local::now().date_naive();

    let total_collected = match count_pages(client, None).await {
        Ok(count) => count,
        Err(err) => {
            warn!("total count failed: {err:#}");
            return NotionStatistics::default();
        }
    };

    let today_collected = count_today(client, today).await.unwrap_or_else(|err| {
        warn!("today count failed: {err:#}");
        0
    });

    let week_filter = json!({
        "property": "날짜",
        "date": {"on_or_after": week_start(today).format("%Y-%m-%d").to_string()}
    });
    let this_week_collected = count_pages(client, Some(week_filter))
        .await
        .unwrap_or_else(|err| {
            warn!("weekly count failed: {err:#}");
            0
        });

    let month_filter = json!({
        "property": "날짜",
        "date": {"on_or_after": month_start(today).format("%Y-%m-%d").to_string()}
    });
    let this_month_collected = count_pages(client, Some(month_filter))
        .await
        .unwrap_or_else(|err| {
            warn!("monthly count failed: {err:#}");
            0
        });

    let custom_period_collected = match (period_type, custom_start, custom_end) {
        ("custom", Some(start), Some(end)) => {
            let filter = json!({
                "and": [
                    {"property": "날짜", "date": {"on_or_after": start.format("%Y-%m-%d").to_string()}},
                    {"property": "날짜", "date": {"on_or_before": end.format("%Y-%m-%d").to_string()}},
                ]
            });
            Some(count_pages(client, Some(filter)).await.unwrap_or_else(|err| {
                warn!("custom period count failed: {err:#}");
                0
            }))
        }
        _ => None,
    };

    NotionStatistics {
        total_collected,
        today_collected,
        this_week_collected,
        this_month_collected,
        custom_period_collected,
    }
}

/// The latest entries by creation time, newest first. Errors yield an
/// empty list.
pub async fn recent_activity(client: &NotionClient, limit: usize) -> Vec<ActivityEntry> {
    let body = json!({
        "sorts": [{"timestamp": "created_time", "direction": "descending"}],
        "page_size": limit,
    });
    let response = match client.query_database(body).await {
        Ok(response) => response,
        Err(err) => {
            warn!("recent activity query failed: {err:#}");
            return Vec::new();
        }
    };
    response
        .get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().map(activity_entry).collect())
        .unwrap_or_default()
}

/// Today's count by the `날짜` date property, falling back to a
/// created-time range when the property query fails.
async fn count_today(client: &NotionClient, today: NaiveDate) -> Result<usize> {
    let by_property = json!({
        "property": "날짜",
        "date": {"equals": today.format("%Y-%m-%d").to_string()}
    });
    match count_pages(client, Some(by_property)).await {
        Ok(count) => Ok(count),
        Err(err) => {
            warn!("today count by date property failed ({err:#}); using created_time");
            let Some(start) = today
                .and_hms_opt(0, 0, 0)
                .and_then(|dt| dt.and_local_timezone(Local).earliest())
            else {
                return Ok(0);
            };
            let end = start + Duration::days(1);
            let fallback = json!({
                "and": [
                    {"timestamp": "created_time", "created_time": {"on_or_after": start.to_rfc3339()}},
                    {"timestamp": "created_time", "created_time": {"before": end.to_rfc3339()}},
                ]
            });
            count_pages(client, Some(fallback)).await
        }
    }
}

/// Counts every page matching the filter, walking the cursor until the
/// database says there is no more.
async fn count_pages(client: &NotionClient, filter: Option<Value>) -> Result<usize> {
    let mut total = 0;
    let mut cursor: Option<String> = None;
    loop {
        let mut body = json!({ "page_size": PAGE_SIZE });
        if let Some(filter) = &filter {
            body["filter"] = filter.clone();
        }
        if let Some(cursor) = &cursor {
            body["start_cursor"] = json!(cursor);
        }
        let response = client.query_database(body).await?;
        total += response
            .get("results")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let has_more = response
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        cursor = response
            .get("next_cursor")
            .and_then(Value::as_str)
            .map(str::to_string);
        if !has_more || cursor.is_none() {
            return Ok(total);
        }
    }
}

fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

fn activity_entry(page: &Value) -> ActivityEntry {
    let properties = &page["properties"];
    let title = properties["제목"]["title"][0]["plain_text"]
        .as_str()
        .unwrap_or("제목 없음")
        .to_string();
    let category = properties["유형"]["select"]["name"]
        .as_str()
        .unwrap_or("카테고리 없음")
        .to_string();
    let keyword = properties["키워드"]["multi_select"][0]["name"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let collected_at = page["created_time"]
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let entry_type = if category == "cafe" { "cafe" } else { "news" }.to_string();
    ActivityEntry {
        title,
        category,
        keyword,
        collected_at,
        entry_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_starts_on_monday() {
        // 2025-03-05 is a Wednesday; its week began on the 3rd.
        let wednesday = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(week_start(wednesday), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        // Sunday rolls back six days, not forward.
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn month_starts_on_the_first() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }

    #[test]
    fn activity_entries_read_the_page_properties() {
        let page = json!({
            "created_time": "2025-03-02T09:30:00.000Z",
            "properties": {
                "제목": {"title": [{"plain_text": "갤럭시 후기"}]},
                "유형": {"select": {"name": "cafe"}},
                "키워드": {"multi_select": [{"name": "갤럭시"}]},
            }
        });
        let entry = activity_entry(&page);
        assert_eq!(entry.title, "갤럭시 후기");
        assert_eq!(entry.category, "cafe");
        assert_eq!(entry.keyword, "갤럭시");
        assert_eq!(entry.entry_type, "cafe");
        assert_eq!(entry.collected_at.to_rfc3339(), "2025-03-02T09:30:00+00:00");
    }

    #[test]
    fn missing_properties_fall_back() {
        let page = json!({
            "created_time": "2025-03-02T09:30:00.000Z",
            "properties": {}
        });
        let entry = activity_entry(&page);
        assert_eq!(entry.title, "제목 없음");
        assert_eq!(entry.category, "카테고리 없음");
        assert_eq!(entry.keyword, "");
        assert_eq!(entry.entry_type, "news");
    }

    #[test]
    fn statistics_serialize_with_wire_names() {
        let stats = NotionStatistics {
            total_collected: 10,
            today_collected: 1,
            this_week_collected: 4,
            this_month_collected: 7,
            custom_period_collected: None,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalCollected"], 10);
        assert_eq!(json["thisWeekCollected"], 4);
        assert!(json.get("customPeriodCollected").is_none());

        let with_custom = NotionStatistics {
            custom_period_collected: Some(3),
            ..stats
        };
        let json = serde_json::to_value(with_custom).unwrap();
        assert_eq!(json["customPeriodCollected"], 3);
    }
}
