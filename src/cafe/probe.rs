//! Search page probes.
//!
//! Everything fragile about the Naver search DOM lives here as pure
//! functions over page HTML, behind [`SearchProbe`] so the tab flow in
//! [`super::scraper`] stays independent of markup details. Each probe
//! carries a chain of fallback selectors because the live page reshuffles
//! its class names regularly.

use crate::naver::period::NaverDateOption;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Markup that only renders for a signed-in session.
const LOGGED_IN_SELECTORS: &[&str] = &[
    "[class*=\"btn_logout\"]",
    "[class*=\"MyView-module\"]",
    "[class*=\"my_area\"]",
    "[class*=\"mynv\"]",
    ".gnb_my",
    "a[href*=\"nidlogin.logout\"]",
];

/// The cafe tab in the search result tab strip.
const CAFE_TAB_SELECTORS: &[&str] = &[
    "a[href*=\"ssc=tab.cafe\"]",
    "a.tab[href*=\"cafe\"]",
    ".api_flicking_wrap a[href*=\"cafe\"]",
];

/// Containers that hold the tab strip when the direct selectors miss.
const TAB_CONTAINER_SELECTORS: &[&str] = &[".api_flicking_wrap", "[role=\"tablist\"]", ".tab_menu"];

/// Containers that signal a populated cafe result list.
const RESULT_CONTAINER_SELECTORS: &[&str] =
    &[".total_wrap", ".cafe_item", ".api_subject_bx", ".lst_total", ".view_list"];

/// Result entry selectors, most specific first. The first tier that
/// matches anything decides the extraction.
const RESULT_ENTRY_SELECTORS: &[&str] = &[
    ".total_wrap .title_area",
    ".title_area a.title_link",
    ".api_subject_bx a",
    ".cafe_item a",
    ".lst_total li a",
    "a[href*=\"cafe.naver.com\"]",
];

/// Login state judged from the Naver home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    LoggedIn,
    LoggedOut,
}

/// What the cafe result area currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMarker {
    /// A result container rendered.
    List,
    /// The explicit no-results block rendered.
    Empty,
}

/// A cafe entry pulled out of the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CafeEntry {
    pub title: String,
    pub url: String,
    pub cafe_name: String,
}

/// DOM judgments the scraper needs, one method per decision point.
pub trait SearchProbe: Send + Sync {
    /// Judges login state from home page HTML. Only signed-in markers
    /// count; a page without them reads as logged out.
    fn login_state(&self, html: &str) -> LoginState;

    /// Finds the cafe tab href in search result HTML.
    fn find_cafe_tab(&self, html: &str) -> Option<String>;

    /// Reports whether the result area has finished rendering, and as
    /// what. `None` means still loading.
    fn result_marker(&self, html: &str) -> Option<ResultMarker>;

    /// Finds the period filter link for the option, when the page offers
    /// one. `all` and `custom` have no link.
    fn find_period_link(&self, html: &str, option: NaverDateOption) -> Option<String>;

    /// Extracts up to `limit` distinct cafe entries from result HTML.
    fn extract_results(&self, html: &str, limit: usize) -> Vec<CafeEntry>;
}

/// Probe for the live Naver pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaverSearchProbe;

impl SearchProbe for NaverSearchProbe {
    fn login_state(&self, html: &str) -> LoginState {
        let document = Html::parse_document(html);
        for selector in LOGGED_IN_SELECTORS {
            if let Ok(sel) = Selector::parse(selector) {
                if document.select(&sel).next().is_some() {
                    return LoginState::LoggedIn;
                }
            }
        }
        // The logout and my-menu controls sometimes ship without any of
        // the class names above.
        if let Ok(sel) = Selector::parse("a, button") {
            for node in document.select(&sel) {
                let text = element_text(node);
                if text.contains("로그아웃")
                    || text == "MY"
                    || text == "마이"
                    || text.ends_with("님")
                {
                    return LoginState::LoggedIn;
                }
            }
        }
        LoginState::LoggedOut
    }

    fn find_cafe_tab(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        for selector in CAFE_TAB_SELECTORS {
            let sel = Selector::parse(selector).ok()?;
            for node in document.select(&sel) {
                let href = node.value().attr("href").unwrap_or_default();
                if element_text(node) == "카페" && href.contains("ssc=tab.cafe") {
                    return Some(href.to_string());
                }
            }
        }
        let anchor_sel = Selector::parse("a").ok()?;
        for container in TAB_CONTAINER_SELECTORS {
            let sel = Selector::parse(container).ok()?;
            for scope in document.select(&sel) {
                if let Some(href) = scope.select(&anchor_sel).find_map(cafe_tab_href) {
                    return Some(href);
                }
            }
        }
        document.select(&anchor_sel).find_map(cafe_tab_href)
    }

    fn result_marker(&self, html: &str) -> Option<ResultMarker> {
        let document = Html::parse_document(html);
        // The explicit empty marker wins over leftover container shells.
        if let Ok(sel) = Selector::parse(".no_result") {
            if document.select(&sel).next().is_some() {
                return Some(ResultMarker::Empty);
            }
        }
        for selector in RESULT_CONTAINER_SELECTORS {
            if let Ok(sel) = Selector::parse(selector) {
                if document.select(&sel).next().is_some() {
                    return Some(ResultMarker::List);
                }
            }
        }
        None
    }

    fn find_period_link(&self, html: &str, option: NaverDateOption) -> Option<String> {
        let number = option.date_option_number();
        if number <= 0 {
            return None;
        }
        let document = Html::parse_document(html);
        let sel = Selector::parse(&format!("a[href*=\"date_option={number}\"]")).ok()?;
        document
            .select(&sel)
            .next()
            .and_then(|node| node.value().attr("href"))
            .map(str::to_string)
    }

    fn extract_results(&self, html: &str, limit: usize) -> Vec<CafeEntry> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for selector in RESULT_ENTRY_SELECTORS {
            let Ok(sel) = Selector::parse(selector) else {
                continue;
            };
            let nodes: Vec<_> = document.select(&sel).collect();
            if nodes.is_empty() {
                continue;
            }
            for node in nodes {
                if entries.len() >= limit {
                    break;
                }
                let Some((title, url)) = entry_parts(node) else {
                    continue;
                };
                if title.is_empty() || !url.contains("cafe.naver.com") {
                    continue;
                }
                if !seen.insert(url.clone()) {
                    continue;
                }
                let cafe_name = cafe_name_from_url(&url);
                entries.push(CafeEntry { title, url, cafe_name });
            }
            break;
        }
        entries
    }
}

/// Accepts an anchor as the cafe tab when its label and href both look
/// like the tab strip entry.
fn cafe_tab_href(node: ElementRef) -> Option<String> {
    let href = node.value().attr("href")?;
    let looks_like_tab =
        href.contains("ssc=tab.cafe") || (href.contains("cafe") && href.contains("tab"));
    if element_text(node) == "카페" && looks_like_tab {
        Some(href.to_string())
    } else {
        None
    }
}

/// Title and href for one result node. Container nodes defer to the
/// anchor inside them; `<mark>` highlights dissolve into plain text.
fn entry_parts(node: ElementRef) -> Option<(String, String)> {
    if node.value().name() == "a" {
        let href = node.value().attr("href")?;
        return Some((element_text(node), href.to_string()));
    }
    let inner = Selector::parse("a.title_link, a[href*=\"cafe.naver.com\"]").ok()?;
    let anchor = node.select(&inner).next()?;
    let href = anchor.value().attr("href")?;
    Some((element_text(anchor), href.to_string()))
}

/// `https://cafe.naver.com/{cafe}/...` keeps the cafe path segment.
fn cafe_name_from_url(url: &str) -> String {
    url.split('/').nth(3).unwrap_or_default().to_string()
}

fn element_text(node: ElementRef) -> String {
    node.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME_LOGGED_IN: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/naver_home_logged_in.html"
    ));
    const HOME_LOGGED_OUT: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/naver_home_logged_out.html"
    ));
    const SEARCH_RESULTS: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/naver_cafe_results.html"
    ));
    const SEARCH_NO_RESULT: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/naver_cafe_no_result.html"
    ));

    #[test]
    fn detects_logged_in_home() {
        assert_eq!(NaverSearchProbe.login_state(HOME_LOGGED_IN), LoginState::LoggedIn);
    }

    #[test]
    fn detects_logged_out_home() {
        assert_eq!(NaverSearchProbe.login_state(HOME_LOGGED_OUT), LoginState::LoggedOut);
    }

    #[test]
    fn logout_text_counts_without_known_classes() {
        let html = r#"<html><body><div class="hdr"><button class="btn">로그아웃</button></div></body></html>"#;
        assert_eq!(NaverSearchProbe.login_state(html), LoginState::LoggedIn);
    }

    #[test]
    fn my_menu_text_counts() {
        let html = r#"<html><body><a href="/my">MY</a></body></html>"#;
        assert_eq!(NaverSearchProbe.login_state(html), LoginState::LoggedIn);
    }

    #[test]
    fn plain_logout_href_counts() {
        let html = r#"<html><body><a href="https://nid.naver.com/nidlogin.logout">나가기</a></body></html>"#;
        assert_eq!(NaverSearchProbe.login_state(html), LoginState::LoggedIn);
    }

    #[test]
    fn finds_cafe_tab_by_primary_selector() {
        let href = NaverSearchProbe.find_cafe_tab(SEARCH_RESULTS).unwrap();
        assert!(href.contains("ssc=tab.cafe"));
    }

    #[test]
    fn finds_cafe_tab_through_container_fallback() {
        let html = r#"<html><body>
            <div class="tab_menu">
                <a href="/search?tab=all">통합</a>
                <a href="/search?tab=menu&where=cafe">카페</a>
            </div>
        </body></html>"#;
        let href = NaverSearchProbe.find_cafe_tab(html).unwrap();
        assert_eq!(href, "/search?tab=menu&where=cafe");
    }

    #[test]
    fn missing_cafe_tab_is_none() {
        let html = r#"<html><body><div class="tab_menu"><a href="/news?tab=1">뉴스</a></div></body></html>"#;
        assert!(NaverSearchProbe.find_cafe_tab(html).is_none());
    }

    #[test]
    fn result_marker_sees_list() {
        assert_eq!(NaverSearchProbe.result_marker(SEARCH_RESULTS), Some(ResultMarker::List));
    }

    #[test]
    fn result_marker_sees_empty_block() {
        assert_eq!(NaverSearchProbe.result_marker(SEARCH_NO_RESULT), Some(ResultMarker::Empty));
    }

    #[test]
    fn result_marker_none_while_loading() {
        let html = "<html><body><div class=\"loading\"></div></body></html>";
        assert_eq!(NaverSearchProbe.result_marker(html), None);
    }

    #[test]
    fn finds_period_link_for_week() {
        let href = NaverSearchProbe
            .find_period_link(SEARCH_RESULTS, NaverDateOption::OneWeek)
            .unwrap();
        assert!(href.contains("date_option=3"));
    }

    #[test]
    fn no_period_link_for_all_or_custom() {
        assert!(NaverSearchProbe.find_period_link(SEARCH_RESULTS, NaverDateOption::All).is_none());
        assert!(NaverSearchProbe
            .find_period_link(SEARCH_RESULTS, NaverDateOption::Custom)
            .is_none());
    }

    #[test]
    fn extracts_deduped_cafe_entries() {
        let entries = NaverSearchProbe.extract_results(SEARCH_RESULTS, 10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "갤럭시 테스트 후기");
        assert_eq!(entries[0].url, "https://cafe.naver.com/joonggonara/987654321");
        assert_eq!(entries[0].cafe_name, "joonggonara");
        assert_eq!(entries[1].cafe_name, "appleiphone");
    }

    #[test]
    fn extraction_respects_limit() {
        let entries = NaverSearchProbe.extract_results(SEARCH_RESULTS, 1);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn extraction_skips_non_cafe_links() {
        for entry in NaverSearchProbe.extract_results(SEARCH_RESULTS, 10) {
            assert!(entry.url.contains("cafe.naver.com"));
        }
    }

    #[test]
    fn bare_anchor_tier_still_extracts() {
        let html = r#"<html><body>
            <a href="https://cafe.naver.com/steamindiegame/55">발로란트 공략</a>
            <a href="https://blog.naver.com/someone/1">블로그</a>
        </body></html>"#;
        let entries = NaverSearchProbe.extract_results(html, 10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cafe_name, "steamindiegame");
    }

    #[test]
    fn cafe_name_comes_from_path_segment() {
        assert_eq!(cafe_name_from_url("https://cafe.naver.com/joonggonara/987654321"), "joonggonara");
        assert_eq!(cafe_name_from_url("https://cafe.naver.com/appleiphone"), "appleiphone");
        assert_eq!(cafe_name_from_url("not a url"), "");
    }
}
