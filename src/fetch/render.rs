//! Headless browser strategy
//!
//! Runs a Chromium-compatible browser with `--dump-dom` so pages that build
//! their content with scripts can still be read. The browser is an external
//! binary; when it is missing the strategy fails and the next one runs.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use url::Url;

use super::{FetchError, FetchResult, FetchStrategy, FetchedPage};
use crate::config::RenderConfig;
use crate::util::truncate_str;

pub struct RenderStrategy {
    browser_path: PathBuf,
    settle_ms: u64,
    timeout: Duration,
}

impl RenderStrategy {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            browser_path: config.browser_path.clone(),
            settle_ms: config.settle_ms,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn command(&self, url: &Url) -> Command {
        let mut cmd = Command::new(&self.browser_path);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg(format!("--virtual-time-budget={}", self.settle_ms))
            .arg("--dump-dom")
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl FetchStrategy for RenderStrategy {
    fn name(&self) -> &'static str {
        "render"
    }

    async fn fetch_html(&self, url: &Url, timeout: Duration) -> FetchResult {
        let start = Instant::now();
        // Rendering needs page load plus settle time on top of the fetch budget.
        let limit = timeout.max(self.timeout);

        let output = tokio::time::timeout(limit, self.command(url).output())
            .await
            .map_err(|_| FetchError::Timeout(limit))?
            .map_err(|e| {
                FetchError::Render(format!(
                    "could not start {}: {}",
                    self.browser_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Render(format!(
                "browser exited with {}: {}",
                output.status,
                truncate_str(stderr.trim(), 200)
            )));
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return Err(FetchError::Render("browser produced an empty document".to_string()));
        }

        Ok(FetchedPage {
            final_url: url.clone(),
            html,
            strategy: self.name(),
            fetch_duration: start.elapsed(),
        })
    }
}
