//! chromiumoxide-backed render client

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::LeadConfig;
use crate::error::ScraperError;
use crate::traits::{RenderClient, ResultEntry, Surface};

const INSTALL_HINT: &str =
    "install Chromium/Chrome or point CHROME_PATH (or the chrome_path config key) at the binary";

/// One shared browser; every surface is a separate tab.
pub struct ChromiumClient {
    browser: Browser,
    handler: JoinHandle<()>,
    poll_interval: Duration,
}

impl ChromiumClient {
    /// Launch the browser. Failure here is fatal for the run.
    pub async fn launch(config: &LeadConfig) -> Result<Self, ScraperError> {
        info!("Launching browser...");

        // unique profile dir so parallel runs don't share a lock
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("ghost-leads-{}", unique_id));

        let chrome_path = config
            .chrome_path
            .clone()
            .or_else(|| std::env::var("CHROME_PATH").ok())
            .or_else(|| std::env::var("CHROMIUM_PATH").ok())
            .unwrap_or_else(|| "chromium".to_string());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800);

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("{} ({})", e, INSTALL_HINT)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(format!("{} ({})", e, INSTALL_HINT)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        info!("Browser launched");
        Ok(Self {
            browser,
            handler,
            poll_interval: config.timing.poll_interval().max(Duration::from_millis(10)),
        })
    }

    pub async fn close(mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");
        self.browser
            .close()
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
        info!("Browser closed");
        Ok(())
    }
}

#[async_trait]
impl RenderClient for ChromiumClient {
    type Surface = ChromiumSurface;

    async fn new_surface(&self) -> Result<ChromiumSurface, ScraperError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        Ok(ChromiumSurface {
            page,
            poll_interval: self.poll_interval,
            closed: AtomicBool::new(false),
        })
    }
}

pub struct ChromiumSurface {
    page: Page,
    poll_interval: Duration,
    closed: AtomicBool,
}

impl ChromiumSurface {
    async fn first(&self, selector: &str) -> Result<Option<Element>, ScraperError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))?;
        Ok(elements.into_iter().next())
    }
}

#[async_trait]
impl Surface for ChromiumSurface {
    type Entry = ChromiumEntry;

    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(ScraperError::Timeout(format!(
                    "{} not found within {}ms",
                    selector,
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn scroll_by(&self, selector: &str, distance: u32) -> Result<(), ScraperError> {
        let selector_js = serde_json::to_string(selector)
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        let script = format!(
            r#"
            (function() {{
                var el = document.querySelector({});
                if (el) {{
                    el.scrollBy(0, {});
                    return true;
                }}
                return false;
            }})()
            "#,
            selector_js, distance
        );

        let scrolled: bool = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?
            .into_value()
            .unwrap_or(false);

        if scrolled {
            Ok(())
        } else {
            Err(ScraperError::ElementNotFound(selector.to_string()))
        }
    }

    async fn entries(&self, selector: &str) -> Result<Vec<ChromiumEntry>, ScraperError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))?;
        Ok(elements
            .into_iter()
            .map(|element| ChromiumEntry { element })
            .collect())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError> {
        match self.first(selector).await? {
            Some(element) => element
                .attribute(name)
                .await
                .map_err(|e| ScraperError::JavaScript(e.to_string())),
            None => Ok(None),
        }
    }

    async fn text(&self, selector: &str) -> Result<String, ScraperError> {
        let element = self
            .first(selector)
            .await?
            .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn click(&self, selector: &str) -> Result<bool, ScraperError> {
        match self.first(selector).await? {
            Some(element) => {
                element
                    .click()
                    .await
                    .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        self.page
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| ScraperError::Navigation(format!("page close: {}", e)))
    }
}

pub struct ChromiumEntry {
    element: Element,
}

impl ChromiumEntry {
    async fn first(&self, selector: &str) -> Result<Option<Element>, ScraperError> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))?;
        Ok(elements.into_iter().next())
    }
}

#[async_trait]
impl ResultEntry for ChromiumEntry {
    async fn text(&self) -> Result<String, ScraperError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn count(&self, selector: &str) -> Result<usize, ScraperError> {
        self.element
            .find_elements(selector)
            .await
            .map(|elements| elements.len())
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError> {
        match self.first(selector).await? {
            Some(element) => element
                .attribute(name)
                .await
                .map_err(|e| ScraperError::JavaScript(e.to_string())),
            None => Ok(None),
        }
    }

    async fn click(&self) -> Result<(), ScraperError> {
        self.element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }
}
