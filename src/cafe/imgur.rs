//! Anonymous Imgur uploads for cafe screenshots.
//!
//! Rotates through a pool of anonymous client ids; the first one that
//! succeeds wins. Runs inside the blocking scrape task, hence the
//! blocking reqwest client.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const UPLOAD_ENDPOINT: &str = "https://api.imgur.com/3/image";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const CLIENT_IDS: &[&str] = &["546c25a59c58ad7", "c9a6efb3d7932fd", "f0ea04148a54268"];

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
    success: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    link: Option<String>,
}

/// Uploads a base64-encoded PNG and returns its public link, or `None`
/// when every client id fails.
pub fn upload_screenshot(image_base64: &str) -> Option<String> {
    for client_id in CLIENT_IDS {
        match try_upload(client_id, image_base64) {
            Ok(link) => {
                info!("imgur upload succeeded via client id {client_id}");
                return Some(link);
            }
            Err(err) => warn!("imgur upload via client id {client_id} failed: {err}"),
        }
    }
    warn!("all imgur client ids failed; keeping the local screenshot only");
    None
}

fn try_upload(client_id: &str, image_base64: &str) -> crate::error::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(UPLOAD_TIMEOUT)
        .build()?;
    let response = client
        .post(UPLOAD_ENDPOINT)
        .header("Authorization", format!("Client-ID {client_id}"))
        .json(&json!({
            "image": image_base64,
            "type": "base64",
            "title": "카페글 스크린샷",
            "description": "네이버 카페글 자동 수집",
        }))
        .send()?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("imgur returned {status}");
    }
    let parsed: UploadResponse = response.json()?;
    if parsed.success == Some(false) {
        anyhow::bail!("imgur reported failure");
    }
    parsed
        .data
        .and_then(|data| data.link)
        .ok_or_else(|| anyhow::anyhow!("imgur response carried no link"))
}
