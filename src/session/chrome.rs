//! Headless Chrome/Chromium session backed by chromiumoxide

use crate::config::SessionConfig;
use crate::session::{BrowserSession, SessionError, SessionResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

const SCROLL_TO_BOTTOM: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

const SCROLL_EXTENT: &str = "document.body.scrollHeight";

/// A single-page Chromium session
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launches a browser and opens a blank page
    pub async fn launch(config: &SessionConfig) -> SessionResult<Self> {
        tracing::info!(headless = config.headless, "Launching browser session");

        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--mute-audio");

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref chrome_path) = config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        let browser_config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Shuts the browser down gracefully
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {e}");
        }
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &Url) -> SessionResult<()> {
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> SessionResult<()> {
        let params =
            SetDeviceMetricsOverrideParams::new(i64::from(width), i64::from(height), 1.0, false);
        self.page
            .execute(params)
            .await
            .map_err(|e| SessionError::Viewport(e.to_string()))?;
        Ok(())
    }

    async fn rendered_markup(&mut self) -> SessionResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Markup(e.to_string()))
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(())
    }

    async fn scroll_extent(&mut self) -> SessionResult<u64> {
        let height = self
            .page
            .evaluate(SCROLL_EXTENT)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .into_value::<f64>()
            .map_err(|e| SessionError::Script(e.to_string()))?;

        Ok(height.max(0.0) as u64)
    }
}
