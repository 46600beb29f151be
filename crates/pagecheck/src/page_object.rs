//! Page Object support.
//!
//! [`BasePage`] holds the wait-aware interaction primitives every page
//! object is composed from. It borrows the driver session exclusively and
//! keeps no element handles between calls: each operation re-resolves its
//! [`Locator`] against the current document.
//!
//! Mutating operations return `&mut Self`, so
//!
//! ```ignore
//! page.open(url)?.enter_text(&EMAIL_INPUT, "a@b.c")?.click_element(&SUBMIT)?;
//! ```
//!
//! issues exactly the same driver calls as three separate statements.

use crate::driver::Driver;
use crate::locator::Locator;
use crate::registry::common;
use crate::result::{PageCheckError, PageCheckResult};
use crate::wait::{poll_until, wait_until, WaitOptions};
use std::time::Duration;
use tracing::{debug, info};

/// A page or component of the UI under test.
pub trait PageObject {
    /// URL or path identifying this page
    fn url_pattern(&self) -> &str;

    /// Whether the browser currently shows this page
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report its URL
    fn is_current(&mut self) -> PageCheckResult<bool>;

    /// Page name for logging
    fn page_name(&self) -> &'static str;
}

/// Rename the generic timeout of a wait to the error the caller reports
fn rename_timeout(err: PageCheckError, f: impl FnOnce(u64) -> PageCheckError) -> PageCheckError {
    match err {
        PageCheckError::Timeout { ms, .. } => f(ms),
        other => other,
    }
}

/// Generic interaction primitives shared by all page objects
#[derive(Debug)]
pub struct BasePage<'a, D: Driver> {
    driver: &'a mut D,
    wait: WaitOptions,
}

impl<'a, D: Driver> BasePage<'a, D> {
    /// Wrap a driver session with the default wait options
    pub fn new(driver: &'a mut D) -> Self {
        Self::with_wait(driver, WaitOptions::default())
    }

    /// Wrap a driver session with explicit wait options
    pub fn with_wait(driver: &'a mut D, wait: WaitOptions) -> Self {
        Self { driver, wait }
    }

    /// Wait options used by the default-timeout operations
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// The underlying driver session
    pub fn driver(&mut self) -> &mut D {
        &mut *self.driver
    }

    /// Navigate to `url`; no wait beyond the driver's own load condition
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    pub fn open(&mut self, url: &str) -> PageCheckResult<&mut Self> {
        info!(url, "open page");
        self.driver.navigate(url)?;
        Ok(self)
    }

    /// Wait for the first element matching `locator` to be present
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotFoundTimeout`] when nothing matches
    /// within the default timeout
    pub fn find_element(&mut self, locator: &Locator) -> PageCheckResult<D::Element> {
        debug!(locator = locator.name(), "find element");
        let options = self.wait;
        let driver = &mut *self.driver;
        poll_until(&options, locator.name(), || {
            Ok(driver.find_all(locator)?.into_iter().next())
        })
        .map_err(|err| {
            rename_timeout(err, |ms| PageCheckError::NotFoundTimeout {
                locator: locator.to_string(),
                ms,
            })
        })
    }

    /// All elements matching `locator` right now, possibly none
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn find_elements(&mut self, locator: &Locator) -> PageCheckResult<Vec<D::Element>> {
        Ok(self.driver.find_all(locator)?)
    }

    /// Wait until the element is clickable, then click it
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotClickableTimeout`] if the element never
    /// becomes clickable within the default timeout
    pub fn click_element(&mut self, locator: &Locator) -> PageCheckResult<&mut Self> {
        info!(locator = locator.name(), "click element");
        let timeout = self.wait.timeout;
        let element = self.wait_for_element_clickable(locator, timeout)?;
        self.driver.click(&element)?;
        Ok(self)
    }

    /// Wait for presence, clear the field, then type `text`
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotFoundTimeout`] if the field never appears
    pub fn enter_text(&mut self, locator: &Locator, text: &str) -> PageCheckResult<&mut Self> {
        info!(locator = locator.name(), chars = text.chars().count(), "enter text");
        let element = self.find_element(locator)?;
        self.driver.clear(&element)?;
        self.driver.type_text(&element, text)?;
        Ok(self)
    }

    /// Wait for presence, then read the element's rendered text
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotFoundTimeout`] if the element never appears
    pub fn get_text(&mut self, locator: &Locator) -> PageCheckResult<String> {
        let element = self.find_element(locator)?;
        Ok(self.driver.text(&element)?)
    }

    /// Snapshot presence check; never waits
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn is_element_present(&mut self, locator: &Locator) -> PageCheckResult<bool> {
        let present = !self.driver.find_all(locator)?.is_empty();
        debug!(locator = locator.name(), present, "presence check");
        Ok(present)
    }

    /// Wait for presence, then report whether the element is displayed
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotFoundTimeout`] if the element never appears
    pub fn is_element_visible(&mut self, locator: &Locator) -> PageCheckResult<bool> {
        let element = self.find_element(locator)?;
        Ok(self.driver.is_displayed(&element)?)
    }

    /// Wait up to `timeout` for the first match to be displayed
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotFoundTimeout`] when no visible match
    /// appears in time
    pub fn wait_for_element_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> PageCheckResult<D::Element> {
        debug!(locator = locator.name(), ?timeout, "wait for visible");
        let options = self.wait.with_timeout(timeout);
        let driver = &mut *self.driver;
        poll_until(&options, locator.name(), || {
            match driver.find_all(locator)?.into_iter().next() {
                Some(element) if driver.is_displayed(&element)? => Ok(Some(element)),
                _ => Ok(None),
            }
        })
        .map_err(|err| {
            rename_timeout(err, |ms| PageCheckError::NotFoundTimeout {
                locator: locator.to_string(),
                ms,
            })
        })
    }

    /// Wait up to `timeout` for the first match to be clickable
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotClickableTimeout`] when the element is
    /// missing or never becomes interactable in time
    pub fn wait_for_element_clickable(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> PageCheckResult<D::Element> {
        debug!(locator = locator.name(), ?timeout, "wait for clickable");
        let options = self.wait.with_timeout(timeout);
        let driver = &mut *self.driver;
        poll_until(&options, locator.name(), || {
            match driver.find_all(locator)?.into_iter().next() {
                Some(element) if driver.is_clickable(&element)? => Ok(Some(element)),
                _ => Ok(None),
            }
        })
        .map_err(|err| {
            rename_timeout(err, |ms| PageCheckError::NotClickableTimeout {
                locator: locator.to_string(),
                ms,
            })
        })
    }

    /// Wait until the current URL differs from `baseline`
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NavigationTimeout`] if no navigation occurs
    pub fn wait_for_url_change(
        &mut self,
        baseline: &str,
        timeout: Duration,
    ) -> PageCheckResult<&mut Self> {
        debug!(baseline, ?timeout, "wait for url change");
        let expected = format!("URL different from '{baseline}'");
        self.wait_for_url(&expected, timeout, |url| url != baseline)?;
        Ok(self)
    }

    /// Poll the current URL until `condition` holds
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NavigationTimeout`] carrying `expected` and
    /// the last observed URL
    pub fn wait_for_url<F>(
        &mut self,
        expected: &str,
        timeout: Duration,
        condition: F,
    ) -> PageCheckResult<String>
    where
        F: Fn(&str) -> bool,
    {
        let options = self.wait.with_timeout(timeout);
        let driver = &mut *self.driver;
        let mut last_seen = String::new();
        let result = poll_until(&options, expected, || {
            let url = driver.current_url()?;
            if condition(&url) {
                Ok(Some(url))
            } else {
                last_seen = url;
                Ok(None)
            }
        });
        result.map_err(|err| {
            rename_timeout(err, |ms| PageCheckError::NavigationTimeout {
                expected: expected.to_string(),
                actual: last_seen,
                ms,
            })
        })
    }

    /// URL of the current document
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report its URL
    pub fn get_current_url(&mut self) -> PageCheckResult<String> {
        Ok(self.driver.current_url()?)
    }

    /// Title of the current document
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report the title
    pub fn get_page_title(&mut self) -> PageCheckResult<String> {
        Ok(self.driver.title()?)
    }

    /// Whether a loading indicator is currently shown
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn has_loading_spinner(&mut self) -> PageCheckResult<bool> {
        self.is_element_present(&common::LOADING_SPINNER)
    }

    /// Wait until no loading indicator is present
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::Timeout`] if the indicator never goes away
    pub fn wait_for_loading_complete(&mut self, timeout: Duration) -> PageCheckResult<&mut Self> {
        debug!(?timeout, "wait for loading complete");
        let options = self.wait.with_timeout(timeout);
        let driver = &mut *self.driver;
        wait_until(&options, "loading indicator to disappear", || {
            Ok(driver.find_all(&common::LOADING_SPINNER)?.is_empty())
        })?;
        Ok(self)
    }

    /// Whether a success alert is currently shown
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn has_success_alert(&mut self) -> PageCheckResult<bool> {
        self.is_element_present(&common::ALERT_SUCCESS)
    }

    /// Whether an error alert is currently shown
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn has_error_alert(&mut self) -> PageCheckResult<bool> {
        self.is_element_present(&common::ALERT_ERROR)
    }

    /// Click the close control if a modal is open right now; otherwise no-op
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::NotClickableTimeout`] if a modal is open
    /// but its close control never becomes clickable
    pub fn close_modal(&mut self) -> PageCheckResult<&mut Self> {
        if self.is_element_present(&common::MODAL_DIALOG)? {
            info!("closing modal dialog");
            self.click_element(&common::CLOSE_BUTTON)?;
        }
        Ok(self)
    }
}
