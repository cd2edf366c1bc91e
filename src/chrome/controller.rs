//! Managed Chrome debug process.
//!
//! The controller owns at most one Chrome child it launched itself, but
//! reality drifts: the user may kill Chrome, or start their own debug
//! instance. `status` therefore reconciles recorded state against the OS
//! before every answer, clearing dead pids and adopting an unrecorded
//! listener on the debug port.

use crate::error::{ClipperError, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromeStatus {
    pub is_running: bool,
    pub pid: Option<u32>,
    pub port: u16,
    pub user_data_dir: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDetails {
    pub pid: u32,
    pub port: u16,
    pub user_data_dir: String,
    pub start_time: DateTime<Utc>,
    pub chrome_path: String,
}

#[derive(Default)]
struct ManagedChrome {
    child: Option<Child>,
    pid: Option<u32>,
    port: u16,
    user_data_dir: Option<String>,
    start_time: Option<DateTime<Utc>>,
}

pub struct ChromeController {
    state: Mutex<ManagedChrome>,
}

impl Default for ChromeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManagedChrome::default()),
        }
    }

    pub async fn status(&self, port: u16) -> ChromeStatus {
        let mut state = self.state.lock().await;
        if let Some(pid) = state.pid {
            if !process_alive(pid).await {
                info!("managed Chrome (pid {pid}) is gone; clearing state");
                *state = ManagedChrome::default();
            }
        }
        if state.pid.is_none() {
            if let Some(pid) = pid_listening_on(port).await {
                info!("adopting Chrome already listening on port {port} (pid {pid})");
                state.pid = Some(pid);
                state.port = port;
            }
        }
        ChromeStatus {
            is_running: state.pid.is_some(),
            pid: state.pid,
            port: if state.port == 0 { port } else { state.port },
            user_data_dir: state.user_data_dir.clone(),
            start_time: state.start_time,
        }
    }

    /// Launches Chrome with remote debugging enabled and verifies the
    /// DevTools endpoint answers. The child stays recorded even when
    /// verification fails, so a follow-up stop can clean it up.
    pub async fn start(&self, port: u16) -> Result<StartDetails> {
        let current = self.status(port).await;
        if current.is_running {
            return Err(
                ClipperError::Browser("Chrome debug mode is already running".to_string()).into(),
            );
        }

        let chrome_path = find_chrome_executable().await.ok_or_else(|| {
            ClipperError::Browser(
                "Chrome executable not found. Is Chrome or Chromium installed?".to_string(),
            )
        })?;

        kill_stray_debug_chrome().await;

        let user_data_dir = std::env::temp_dir().join(format!("chrome-debug-{}", std::env::consts::OS));
        let user_data_dir = user_data_dir.display().to_string();
        let child = Command::new(&chrome_path)
            .arg(format!("--remote-debugging-port={port}"))
            .arg(format!("--user-data-dir={user_data_dir}"))
            .arg("--no-first-run")
            .arg("--disable-default-apps")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-renderer-backgrounding")
            .arg("--disable-backgrounding-occluded-windows")
            .arg("https://naver.com")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("launching {chrome_path}"))?;
        let pid = child
            .id()
            .ok_or_else(|| ClipperError::Browser("spawned Chrome exited immediately".to_string()))?;
        let start_time = Utc::now();
        {
            let mut state = self.state.lock().await;
            *state = ManagedChrome {
                child: Some(child),
                pid: Some(pid),
                port,
                user_data_dir: Some(user_data_dir.clone()),
                start_time: Some(start_time),
            };
        }
        info!("launched Chrome debug mode (pid {pid}, port {port})");

        tokio::time::sleep(Duration::from_secs(3)).await;
        if super::cdp::fetch_version("localhost", port).await.is_err() {
            return Err(ClipperError::Browser(
                "Chrome started but the debug port did not respond".to_string(),
            )
            .into());
        }

        Ok(StartDetails {
            pid,
            port,
            user_data_dir,
            start_time,
            chrome_path,
        })
    }

    /// Terminates the managed (or adopted) Chrome: SIGTERM now, plus a
    /// detached 5s timer that force-kills if the process lingers.
    pub async fn stop(&self, port: u16) -> Result<()> {
        let current = self.status(port).await;
        if !current.is_running {
            return Err(
                ClipperError::Browser("Chrome debug mode is not running".to_string()).into(),
            );
        }
        let (child, pid) = {
            let mut state = self.state.lock().await;
            let child = state.child.take();
            let pid = state.pid.take();
            *state = ManagedChrome::default();
            (child, pid)
        };
        if let Some(pid) = pid {
            terminate(pid).await;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                if process_alive(pid).await {
                    warn!("Chrome (pid {pid}) ignored SIGTERM; force killing");
                    force_kill(pid).await;
                }
            });
        }
        drop(child);
        info!("Chrome debug mode stopped");
        Ok(())
    }
}

/// Chrome executable candidates for the current platform, probed with
/// `--version`.
fn chrome_candidates() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    } else {
        &[
            "google-chrome",
            "google-chrome-stable",
            "chromium-browser",
            "chromium",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium-browser",
        ]
    }
}

async fn find_chrome_executable() -> Option<String> {
    for candidate in chrome_candidates() {
        if let Ok(output) = Command::new(candidate).arg("--version").output().await {
            if output.status.success() {
                return Some((*candidate).to_string());
            }
        }
    }
    None
}

// The reconciliation helpers shell out to unix tools; on other hosts they
// degrade to "not running" rather than guessing.

async fn process_alive(pid: u32) -> bool {
    if !cfg!(unix) {
        return false;
    }
    match Command::new("ps")
        .args(["-p", &pid.to_string(), "-o", "pid="])
        .output()
        .await
    {
        Ok(output) => !String::from_utf8_lossy(&output.stdout).trim().is_empty(),
        Err(_) => false,
    }
}

async fn pid_listening_on(port: u16) -> Option<u32> {
    if !cfg!(unix) {
        return None;
    }
    let output = Command::new("lsof")
        .args(["-ti", &format!(":{port}")])
        .output()
        .await
        .ok()?;
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

async fn terminate(pid: u32) {
    if !cfg!(unix) {
        return;
    }
    let _ = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .output()
        .await;
}

async fn force_kill(pid: u32) {
    if !cfg!(unix) {
        return;
    }
    let _ = Command::new("kill")
        .args(["-KILL", &pid.to_string()])
        .output()
        .await;
}

/// Kills leftover debug-mode instances before launching a fresh one, then
/// lets the OS settle.
async fn kill_stray_debug_chrome() {
    if !cfg!(unix) {
        return;
    }
    let _ = Command::new("pkill")
        .args(["-f", "chrome.*remote-debugging-port"])
        .output()
        .await;
    tokio::time::sleep(Duration::from_secs(2)).await;
}
