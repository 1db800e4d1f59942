//! Headless Chromium renderer
//!
//! Every render launches its own browser process and closes it afterwards,
//! so one misbehaving site cannot leak state into the next.

use crate::config::BrowserConfig;
use crate::fetch::rendered::{PageRenderer, RenderedPage};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// [`PageRenderer`] backed by a local Chrome/Chromium install
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    config: BrowserConfig,
    user_agent: String,
}

impl ChromeRenderer {
    pub fn new(config: BrowserConfig, user_agent: impl Into<String>) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
        }
    }

    async fn load(&self, browser: &Browser, url: &Url) -> FetchResult<RenderedPage> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error(url, e))?;

        let settle = Duration::from_millis(self.config.settle_ms);
        let loaded = async {
            page.set_user_agent(SetUserAgentOverrideParams::new(self.user_agent.clone()))
                .await?;
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            tokio::time::sleep(settle).await;
            let html = page.content().await?;
            let final_url = page.url().await?;
            Ok::<_, CdpError>((html, final_url))
        }
        .await;

        if let Err(e) = page.close().await {
            debug!(url = %url, error = %e, "Failed to close page");
        }

        let (html, final_url) = loaded.map_err(|e| browser_error(url, e))?;
        let final_url = final_url
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(RenderedPage { final_url, html })
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &Url) -> FetchResult<RenderedPage> {
        let session = BrowserSession::launch(&self.config, url).await?;

        let secs = self.config.navigation_timeout_secs;
        let result = match tokio::time::timeout(
            Duration::from_secs(secs),
            self.load(&session.browser, url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                secs,
            }),
        };

        session.close().await;
        result
    }
}

/// A launched browser plus the task driving its CDP connection
///
/// Dropping the session aborts the handler task; [`BrowserSession::close`]
/// also shuts the browser process down cleanly.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: &BrowserConfig, url: &Url) -> FetchResult<Self> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder.build().map_err(|message| FetchError::Browser {
            url: url.to_string(),
            message,
        })?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| browser_error(url, e))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "Failed to reap browser process");
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn browser_error(url: &Url, error: CdpError) -> FetchError {
    FetchError::Browser {
        url: url.to_string(),
        message: error.to_string(),
    }
}
