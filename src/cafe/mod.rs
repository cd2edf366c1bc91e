//! Cafe post collection from Naver search results, driven through a real
//! logged-in Chrome.

pub mod imgur;
pub mod probe;
pub mod scraper;

pub use scraper::CafeScraper;
