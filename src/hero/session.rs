//! Headless Chrome lifecycle for the banner crawl. One browser is
//! reused across brands; a detected browser-death error triggers a full
//! relaunch from the brand loop.

use crate::config::HeroConfig;
use crate::error::{AppError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use std::time::Duration;

pub struct BrowserSession {
    browser: Option<Browser>,
    headless: bool,
    user_agent: String,
    nav_timeout: Duration,
    settle_wait: Duration,
}

impl BrowserSession {
    pub fn new(config: &HeroConfig) -> Self {
        Self {
            browser: None,
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            nav_timeout: Duration::from_millis(config.nav_timeout_ms),
            settle_wait: Duration::from_millis(config.wait_after_goto_ms),
        }
    }

    pub async fn launch(&mut self) -> Result<()> {
        println!("[BrowserSession] Launching Chrome with headless={}", self.headless);

        let mut browser_config = BrowserConfig::builder()
            .window_size(1440, 900)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage")
            .arg("--lang=ko-KR")
            .arg(format!("--user-agent={}", self.user_agent));

        if self.headless {
            browser_config = browser_config.arg("--headless").arg("--disable-gpu");
        } else {
            browser_config = browser_config.with_head();
        }

        let config = browser_config
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to build browser config: {}", e)))?;

        let mut last_error = None;
        for attempt in 1..=3u64 {
            match Browser::launch(config.clone()).await {
                Ok((browser, mut handler)) => {
                    tokio::spawn(async move {
                        while let Some(event) = handler.next().await {
                            if let Err(e) = event {
                                let error_str = format!("{:?}", e);
                                // CDP deserialization noise is not actionable
                                if !error_str.contains("data did not match any variant") {
                                    tracing::debug!("browser handler error: {}", e);
                                }
                            }
                        }
                    });
                    self.browser = Some(browser);
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < 3 {
                        println!("[BrowserSession] Launch attempt {} failed, retrying...", attempt);
                        tokio::time::sleep(Duration::from_millis(1000 * attempt)).await;
                    }
                }
            }
        }

        Err(AppError::Browser(format!(
            "Failed to launch browser after 3 attempts: {}",
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    pub async fn relaunch(&mut self) -> Result<()> {
        println!("[BrowserSession] Relaunching browser");
        let _ = self.close().await;
        self.launch().await
    }

    /// Open a page and navigate. Navigation wait is tolerant: a slow
    /// "load" never fails the brand by itself.
    pub async fn open(&self, url: &str) -> Result<Page> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AppError::Browser("Browser not launched".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Browser(format!("Failed to create page: {}", e)))?;

        if let Err(e) = self.navigate(&page, url, self.nav_timeout).await {
            let _ = page.close().await;
            return Err(e);
        }
        tokio::time::sleep(self.settle_wait).await;
        Ok(page)
    }

    /// Open a secondary page with its own (shorter) navigation budget,
    /// used for campaign-date lookups.
    pub async fn open_with_timeout(&self, url: &str, timeout: Duration) -> Result<Page> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AppError::Browser("Browser not launched".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Browser(format!("Failed to create page: {}", e)))?;

        if let Err(e) = self.navigate(&page, url, timeout).await {
            let _ = page.close().await;
            return Err(e);
        }
        Ok(page)
    }

    async fn navigate(&self, page: &Page, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(AppError::Browser(format!("Failed to navigate: {}", e)));
            }
            Err(_) => {
                return Err(AppError::Browser(format!("Navigation timed out: {}", url)));
            }
        }

        // settle like "networkidle", but never hard-fail on it
        match tokio::time::timeout(Duration::from_secs(8), page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "navigation wait error, continuing"),
            Err(_) => tracing::debug!("navigation wait timed out, continuing"),
        }
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            browser
                .close()
                .await
                .map_err(|e| AppError::Browser(format!("Failed to close browser: {}", e)))?;
        }
        Ok(())
    }
}

/// A dead browser looks different from a dead site: these messages mean
/// relaunch, not skip.
pub fn is_closed_error(err: &AppError) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("has been closed") || msg.contains("target page") || msg.contains("browser closed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_error_detection() {
        assert!(is_closed_error(&AppError::Browser(
            "Connection has been closed".to_string()
        )));
        assert!(is_closed_error(&AppError::Browser(
            "Target page crashed".to_string()
        )));
        assert!(!is_closed_error(&AppError::Browser(
            "Navigation timed out: https://example.com".to_string()
        )));
    }
}
