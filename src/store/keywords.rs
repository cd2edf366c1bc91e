//! Keyword store.
//!
//! Keywords and their collection defaults share one file,
//! `{data_dir}/keywords.json`. Every operation loads the file, mutates, and
//! writes the whole file back.

use crate::error::{ClipperError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub id: String,
    pub term: String,
    pub category: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Collection defaults stored beside the keywords. `cron_time` is recorded
/// for external schedulers; this process never executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordSettings {
    pub default_news_count: u32,
    pub default_date_range: u32,
    pub cron_time: String,
    pub auto_execution: bool,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            default_news_count: 10,
            default_date_range: 7,
            cron_time: "0 10 * * *".to_string(),
            auto_execution: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct KeywordFile {
    keywords: Vec<Keyword>,
    settings: KeywordSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStatistics {
    pub total_keywords: usize,
    pub active_keywords: usize,
    pub categories: HashMap<String, usize>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct KeywordStore {
    path: PathBuf,
}

impl KeywordStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("keywords.json"),
        }
    }

    fn load(&self) -> KeywordFile {
        super::read_json(&self.path).unwrap_or_default()
    }

    fn save(&self, file: &KeywordFile) -> Result<()> {
        super::write_json(&self.path, file)
    }

    /// Lists keywords, optionally filtered to active ones and by a
    /// case-insensitive substring over term or category.
    pub fn list(&self, query: Option<&str>, active_only: bool) -> Vec<Keyword> {
        let mut keywords = self.load().keywords;
        if active_only {
            keywords.retain(|k| k.active);
        }
        if let Some(query) = query {
            let needle = query.to_lowercase();
            keywords.retain(|k| {
                k.term.to_lowercase().contains(&needle)
                    || k.category.to_lowercase().contains(&needle)
            });
        }
        keywords
    }

    pub fn settings(&self) -> KeywordSettings {
        self.load().settings
    }

    pub fn statistics(&self) -> KeywordStatistics {
        let keywords = self.load().keywords;
        let mut categories: HashMap<String, usize> = HashMap::new();
        for keyword in &keywords {
            *categories.entry(keyword.category.clone()).or_default() += 1;
        }
        KeywordStatistics {
            total_keywords: keywords.len(),
            active_keywords: keywords.iter().filter(|k| k.active).count(),
            categories,
            last_updated: keywords.iter().map(|k| k.updated_at).max(),
        }
    }

    pub fn add(&self, term: &str, category: &str) -> Result<Keyword> {
        let term = term.trim();
        let category = category.trim();
        if term.is_empty() || category.is_empty() {
            return Err(
                ClipperError::Validation("keyword and category are required".to_string()).into(),
            );
        }
        if term.chars().count() < 2 {
            return Err(ClipperError::Validation(
                "keyword must be at least 2 characters".to_string(),
            )
            .into());
        }
        let mut file = self.load();
        if file
            .keywords
            .iter()
            .any(|k| k.term.to_lowercase() == term.to_lowercase())
        {
            return Err(
                ClipperError::Validation(format!("keyword \"{term}\" already exists")).into(),
            );
        }
        let now = Utc::now();
        let keyword = Keyword {
            id: new_keyword_id(),
            term: term.to_string(),
            category: category.to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        file.keywords.push(keyword.clone());
        self.save(&file)?;
        Ok(keyword)
    }

    pub fn get(&self, id: &str) -> Result<Keyword> {
        let keyword = self
            .load()
            .keywords
            .into_iter()
            .find(|k| k.id == id)
            .ok_or_else(|| ClipperError::NotFound(format!("keyword {id}")))?;
        Ok(keyword)
    }

    /// Partial update. A new term is re-validated for length and for
    /// duplicates against every other keyword.
    pub fn update(&self, id: &str, term: Option<&str>, category: Option<&str>) -> Result<Keyword> {
        let mut file = self.load();
        if let Some(term) = term {
            let term = term.trim();
            if term.chars().count() < 2 {
                return Err(ClipperError::Validation(
                    "keyword must be at least 2 characters".to_string(),
                )
                .into());
            }
            if file
                .keywords
                .iter()
                .any(|k| k.id != id && k.term.to_lowercase() == term.to_lowercase())
            {
                return Err(
                    ClipperError::Validation(format!("keyword \"{term}\" already exists")).into(),
                );
            }
        }
        let keyword = file
            .keywords
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| ClipperError::NotFound(format!("keyword {id}")))?;
        if let Some(term) = term {
            keyword.term = term.trim().to_string();
        }
        if let Some(category) = category {
            keyword.category = category.trim().to_string();
        }
        keyword.updated_at = Utc::now();
        let updated = keyword.clone();
        self.save(&file)?;
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut file = self.load();
        let before = file.keywords.len();
        file.keywords.retain(|k| k.id != id);
        if file.keywords.len() == before {
            return Err(ClipperError::NotFound(format!("keyword {id}")).into());
        }
        self.save(&file)
    }

    pub fn toggle(&self, id: &str) -> Result<Keyword> {
        let mut file = self.load();
        let keyword = file
            .keywords
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| ClipperError::NotFound(format!("keyword {id}")))?;
        keyword.active = !keyword.active;
        keyword.updated_at = Utc::now();
        let updated = keyword.clone();
        self.save(&file)?;
        Ok(updated)
    }
}

/// Ids embed the creation time so they sort chronologically; the random
/// base-36 tail keeps rapid successive creations unique.
fn new_keyword_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("keyword_{}_{}", Utc::now().timestamp_millis(), suffix)
}
