//! Blocking front for a WebDriver session.
//!
//! fantoccini is async; the crawler is not. [`Browser`] owns a
//! current-thread tokio runtime and blocks on every command, so callers
//! see plain synchronous calls.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::config::{BrowserKind, BrowserSettings};
use crate::error::StoreError;
use crate::gihyo::download::SessionCookie;

const URL_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct Browser {
    runtime: Runtime,
    client: Client,
}

impl Browser {
    pub fn launch(settings: &BrowserSettings, headless: bool) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start the webdriver runtime")?;

        info!(
            "Connecting to {} webdriver at {} (headless: {})",
            settings.kind, settings.webdriver_url, headless
        );
        let client = runtime
            .block_on(async {
                let mut builder = ClientBuilder::native();
                builder.capabilities(capabilities(settings.kind, headless));
                builder.connect(&settings.webdriver_url).await
            })
            .with_context(|| {
                format!(
                    "Failed to open a browser session at {}",
                    settings.webdriver_url
                )
            })?;

        Ok(Self { runtime, client })
    }

    pub fn goto(&self, url: &str) -> Result<(), StoreError> {
        debug!("goto {}", url);
        Ok(self.runtime.block_on(self.client.goto(url))?)
    }

    pub fn current_url(&self) -> Result<String, StoreError> {
        let url = self.runtime.block_on(self.client.current_url())?;
        Ok(url.to_string())
    }

    pub fn source(&self) -> Result<String, StoreError> {
        Ok(self.runtime.block_on(self.client.source())?)
    }

    /// Waits up to `timeout` for the element to be present.
    pub fn wait_for(&self, locator: Locator<'_>, timeout: Duration) -> Result<Element, StoreError> {
        let what = format!("{locator:?}");
        self.runtime
            .block_on(self.client.wait().at_most(timeout).for_element(locator))
            .map_err(|err| match StoreError::from(err) {
                StoreError::Timeout(_) => StoreError::Timeout(what),
                other => other,
            })
    }

    pub fn click(&self, locator: Locator<'_>, timeout: Duration) -> Result<(), StoreError> {
        let element = self.wait_for(locator, timeout)?;
        Ok(self.runtime.block_on(element.click())?)
    }

    pub fn fill(&self, locator: Locator<'_>, text: &str, timeout: Duration) -> Result<(), StoreError> {
        let element = self.wait_for(locator, timeout)?;
        self.runtime.block_on(async {
            element.click().await?;
            element.clear().await?;
            element.send_keys(text).await
        })?;
        Ok(())
    }

    pub fn attr(&self, element: &Element, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.runtime.block_on(element.attr(name))?)
    }

    /// Polls the current URL until it equals `url`.
    pub fn wait_for_url(&self, url: &str, timeout: Duration) -> Result<(), StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            let current = self.current_url()?;
            if same_page(&current, url) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(StoreError::Timeout(format!(
                    "waiting for {url}, still at {current}"
                )));
            }
            std::thread::sleep(URL_POLL_INTERVAL);
        }
    }

    pub fn cookies(&self) -> Result<Vec<SessionCookie>, StoreError> {
        let cookies = self.runtime.block_on(self.client.get_all_cookies())?;
        Ok(cookies
            .iter()
            .map(|cookie| SessionCookie {
                name: cookie.name().to_owned(),
                value: cookie.value().to_owned(),
                domain: cookie.domain().map(str::to_owned),
                path: cookie.path().map(str::to_owned),
            })
            .collect())
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        let client = self.client.clone();
        if let Err(err) = self.runtime.block_on(client.close()) {
            debug!("Failed to close the browser session: {}", err);
        }
    }
}

fn same_page(current: &str, expected: &str) -> bool {
    current.trim_end_matches('/') == expected.trim_end_matches('/')
}

/// WebDriver capabilities for the configured browser.
pub fn capabilities(kind: BrowserKind, headless: bool) -> Map<String, Value> {
    let mut caps = Map::new();
    match kind {
        BrowserKind::Chrome => {
            let mut args = vec!["--window-size=1280,1024"];
            if headless {
                args.push("--headless=new");
            }
            caps.insert("browserName".to_owned(), json!("chrome"));
            caps.insert("goog:chromeOptions".to_owned(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
            caps.insert("browserName".to_owned(), json!("firefox"));
            caps.insert("moz:firefoxOptions".to_owned(), json!({ "args": args }));
        }
    }
    caps
}
