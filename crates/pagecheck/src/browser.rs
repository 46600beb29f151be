//! Chromium driver over the Chrome `DevTools` Protocol.
//!
//! [`ChromiumDriver`] implements the synchronous [`Driver`] trait on top of
//! chromiumoxide. It owns a current-thread tokio runtime and blocks on each
//! CDP call; the CDP event handler is a task on that runtime, so it is
//! polled whenever a call is in flight.
//!
//! Only available with the `browser` feature.

use crate::config::BrowserSettings;
use crate::driver::Driver;
use crate::locator::{Locator, Query};
use crate::result::{DriverError, DriverResult};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::future::Future;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const IS_DISPLAYED_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    return style.display !== 'none' && style.visibility !== 'hidden' \
        && rect.width > 0 && rect.height > 0; }";

const IS_ENABLED_JS: &str = "function() { return !this.disabled; }";

const IS_CLICKABLE_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    if (style.display === 'none' || style.visibility === 'hidden' \
        || rect.width === 0 || rect.height === 0 || this.disabled) { return false; } \
    const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2); \
    return hit !== null && (hit === this || this.contains(hit)); }";

const CLEAR_JS: &str = "function() { \
    this.value = ''; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
    this.dispatchEvent(new Event('change', { bubbles: true })); }";

/// CDP error text reported for a node detached from the document
const DETACHED_NODE_MARKERS: [&str; 3] = [
    "No node with given id",
    "Could not find node with given id",
    "Node is detached",
];

fn protocol_error(err: impl std::fmt::Display) -> DriverError {
    let message = err.to_string();
    if DETACHED_NODE_MARKERS.iter().any(|m| message.contains(m)) {
        DriverError::stale(message)
    } else {
        DriverError::protocol(message)
    }
}

fn launch_error(err: impl std::fmt::Display) -> DriverError {
    DriverError::Launch {
        message: err.to_string(),
    }
}

/// A headless (or headed) Chromium session
#[derive(Debug)]
pub struct ChromiumDriver {
    runtime: Runtime,
    browser: Option<CdpBrowser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium with `settings` and open a blank tab
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Launch`] if the runtime, the browser process,
    /// or the first tab cannot be created
    pub fn launch(settings: &BrowserSettings) -> DriverResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(launch_error)?;

        let mut builder = CdpConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .args(settings.launch_args());
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(launch_error)?;

        let (browser, mut events) = runtime
            .block_on(CdpBrowser::launch(config))
            .map_err(launch_error)?;
        let handler = runtime.spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        let page = runtime
            .block_on(browser.new_page("about:blank"))
            .map_err(launch_error)?;

        info!(headless = settings.headless, "chromium launched");
        Ok(Self {
            runtime,
            browser: Some(browser),
            page,
            handler,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> DriverResult<F::Output> {
        if self.browser.is_none() {
            return Err(DriverError::SessionClosed);
        }
        Ok(self.runtime.block_on(future))
    }

    fn call_bool(&self, element: &Element, function: &str) -> DriverResult<bool> {
        let returns = self
            .block_on(element.call_js_fn(function, false))?
            .map_err(protocol_error)?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

impl Driver for ChromiumDriver {
    type Element = Element;

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        debug!(url, "goto");
        let _ = self.block_on(self.page.goto(url))?.map_err(protocol_error)?;
        Ok(())
    }

    fn find_all(&mut self, locator: &Locator) -> DriverResult<Vec<Element>> {
        let found = match locator.query() {
            Query::Css(css) => self.block_on(self.page.find_elements(css))?,
            Query::XPath(xpath) => self.block_on(self.page.find_xpaths(xpath))?,
        };
        found.map_err(protocol_error)
    }

    fn click(&mut self, element: &Element) -> DriverResult<()> {
        let _ = self.block_on(element.click())?.map_err(protocol_error)?;
        Ok(())
    }

    fn clear(&mut self, element: &Element) -> DriverResult<()> {
        let _ = self
            .block_on(element.call_js_fn(CLEAR_JS, false))?
            .map_err(protocol_error)?;
        Ok(())
    }

    fn type_text(&mut self, element: &Element, text: &str) -> DriverResult<()> {
        let _ = self.block_on(element.focus())?.map_err(protocol_error)?;
        let _ = self.block_on(element.type_str(text))?.map_err(protocol_error)?;
        Ok(())
    }

    fn text(&mut self, element: &Element) -> DriverResult<String> {
        let text = self.block_on(element.inner_text())?.map_err(protocol_error)?;
        Ok(text.unwrap_or_default())
    }

    fn is_displayed(&mut self, element: &Element) -> DriverResult<bool> {
        self.call_bool(element, IS_DISPLAYED_JS)
    }

    fn is_enabled(&mut self, element: &Element) -> DriverResult<bool> {
        self.call_bool(element, IS_ENABLED_JS)
    }

    fn is_clickable(&mut self, element: &Element) -> DriverResult<bool> {
        self.call_bool(element, IS_CLICKABLE_JS)
    }

    fn current_url(&mut self) -> DriverResult<String> {
        let url = self.block_on(self.page.url())?.map_err(protocol_error)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    fn title(&mut self) -> DriverResult<String> {
        let title = self.block_on(self.page.get_title())?.map_err(protocol_error)?;
        Ok(title.unwrap_or_default())
    }

    fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
        use base64::Engine;

        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.block_on(self.page.execute(params))?.map_err(protocol_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(protocol_error)
    }

    fn page_source(&mut self) -> DriverResult<String> {
        self.block_on(self.page.content())?.map_err(protocol_error)
    }

    fn quit(&mut self) -> DriverResult<()> {
        let Some(mut browser) = self.browser.take() else {
            return Err(DriverError::SessionClosed);
        };
        let closed = self.runtime.block_on(async {
            let result = browser.close().await;
            let _ = browser.wait().await;
            result
        });
        self.handler.abort();
        info!("chromium closed");
        closed.map(|_| ()).map_err(protocol_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_node_is_stale() {
        let err = protocol_error("Could not find node with given id");
        assert!(matches!(err, DriverError::StaleElement { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_errors_are_protocol() {
        let err = protocol_error("Target closed");
        assert!(matches!(err, DriverError::Protocol { .. }));
    }

    #[test]
    #[ignore = "requires a local Chromium"]
    fn test_launch_and_read_blank_page() {
        let mut driver = ChromiumDriver::launch(&BrowserSettings::default()).unwrap();
        assert_eq!(driver.current_url().unwrap(), "about:blank");
        assert!(crate::driver::is_png(&driver.screenshot().unwrap()));
        driver.quit().unwrap();
        assert!(matches!(driver.title(), Err(DriverError::SessionClosed)));
    }
}
