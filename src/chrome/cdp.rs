//! DevTools HTTP endpoint probes (`/json/version`, `/json`).

use crate::error::Result;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser", default)]
    pub browser: Option<String>,
    #[serde(rename = "User-Agent", default)]
    pub user_agent: Option<String>,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub web_socket_debugger_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TabInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub tab_type: String,
}

fn probe_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .context("building CDP probe client")
}

pub async fn fetch_version(host: &str, port: u16) -> Result<VersionInfo> {
    let url = format!("http://{host}:{port}/json/version");
    let response = probe_client()?
        .get(&url)
        .send()
        .await
        .with_context(|| format!("querying {url}"))?;
    if !response.status().is_success() {
        anyhow::bail!("CDP version probe returned {}", response.status());
    }
    let info = response.json().await.context("decoding CDP version info")?;
    Ok(info)
}

pub async fn list_tabs(host: &str, port: u16) -> Result<Vec<TabInfo>> {
    let url = format!("http://{host}:{port}/json");
    let response = probe_client()?
        .get(&url)
        .send()
        .await
        .with_context(|| format!("querying {url}"))?;
    if !response.status().is_success() {
        anyhow::bail!("CDP tab probe returned {}", response.status());
    }
    let tabs = response.json().await.context("decoding CDP tab list")?;
    Ok(tabs)
}

/// Estimates whether Chrome holds a logged-in Naver session, judged from
/// the first Naver page tab: a `www.naver.com` URL whose title is not the
/// login page and which has not been redirected to `nid.naver.com`.
pub fn naver_login_from_tabs(tabs: &[TabInfo]) -> bool {
    match tabs
        .iter()
        .find(|tab| tab.tab_type == "page" && tab.url.contains("naver.com"))
    {
        Some(tab) => {
            tab.url.contains("www.naver.com")
                && !tab.title.contains("로그인")
                && !tab.url.contains("nid.naver.com")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(url: &str, title: &str, tab_type: &str) -> TabInfo {
        TabInfo {
            url: url.to_string(),
            title: title.to_string(),
            tab_type: tab_type.to_string(),
        }
    }

    #[test]
    fn logged_in_when_a_plain_home_tab_is_open() {
        let tabs = vec![
            tab("chrome://newtab", "New Tab", "page"),
            tab("https://www.naver.com/", "NAVER", "page"),
        ];
        assert!(naver_login_from_tabs(&tabs));
    }

    #[test]
    fn login_redirect_means_logged_out() {
        let tabs = vec![tab(
            "https://nid.naver.com/nidlogin.login?mode=form",
            "네이버 : 로그인",
            "page",
        )];
        assert!(!naver_login_from_tabs(&tabs));
    }

    #[test]
    fn login_title_means_logged_out() {
        let tabs = vec![tab("https://www.naver.com/", "네이버 로그인", "page")];
        assert!(!naver_login_from_tabs(&tabs));
    }

    #[test]
    fn the_first_naver_tab_decides() {
        // A cafe tab before the home tab: the estimate follows the first.
        let tabs = vec![
            tab("https://cafe.naver.com/somecafe", "카페", "page"),
            tab("https://www.naver.com/", "NAVER", "page"),
        ];
        assert!(!naver_login_from_tabs(&tabs));
    }

    #[test]
    fn non_page_targets_are_ignored() {
        let tabs = vec![tab(
            "https://www.naver.com/favicon",
            "NAVER",
            "background_page",
        )];
        assert!(!naver_login_from_tabs(&tabs));
    }

    #[test]
    fn no_tabs_means_logged_out() {
        assert!(!naver_login_from_tabs(&[]));
    }
}
