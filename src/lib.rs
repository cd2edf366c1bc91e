//! Clipper - Naver news and cafe collection backend
//!
//! This library provides the HTTP API, scrapers and Notion sink for
//! collecting Korean news articles and cafe posts by keyword and filing
//! them into a Notion database.

pub mod api;
pub mod app;
pub mod cafe;
pub mod chrome;
pub mod config;
pub mod error;
pub mod naver;
pub mod notion;
pub mod scraping;
pub mod store;
