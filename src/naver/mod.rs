//! Naver integrations: the Open API news client and the search period
//! options shared with the cafe scraper.

pub mod news;
pub mod period;
