//! Pagecheck: page-object UI tests for a web login flow
//!
//! Scenarios drive a browser through page objects. Each page object wraps a
//! [`Driver`], waits by polling, and reports every timeout with the locator
//! or URL it was waiting for.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGECHECK Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │    │ Page       │    │ Driver     │            │
//! │   │ (login     │───►│ Objects    │───►│ (chromium  │            │
//! │   │  suite)    │    │ + Locators │    │  or mock)  │            │
//! │   └─────┬──────┘    └────────────┘    └────────────┘            │
//! │         │ ScenarioRunner: session teardown, failure hooks       │
//! │         ▼                                                       │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ Reporter   │───►│ Allure     │  HTML / JSON / JUnit         │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pagecheck::{DemoSite, LoginPage, SuiteConfig};
//!
//! let site = DemoSite::default();
//! let config = SuiteConfig {
//!     login_url: site.login_url.clone(),
//!     projects_url: site.projects_url.clone(),
//!     poll_interval_ms: 10,
//!     ..SuiteConfig::default()
//! };
//! let mut driver = site.driver();
//! let mut page = LoginPage::new(&mut driver, &config);
//! page.open()?
//!     .login_and_wait("test@example.com", "password", config.default_timeout())?;
//! assert!(page.is_on_projects_page()?);
//! # Ok::<(), pagecheck::PageCheckError>(())
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod allure;
mod attachment;
#[cfg(feature = "browser")]
mod browser;
mod config;
mod driver;
mod failure;
mod locator;
mod login;
mod mock_driver;
mod page_object;
mod reporter;
mod result;
mod runner;
mod session;
mod wait;

/// Locator catalogue, grouped by page
pub mod registry;

/// The login suite scenarios
pub mod scenarios;

pub use allure::ResultsDirectory;
pub use attachment::{
    Attachment, AttachmentKind, MemorySink, ReportSink, Severity, TestMetadata,
};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{
    BrowserSettings, SuiteConfig, DEFAULT_LOGIN_URL, DEFAULT_PROJECTS_PATH, DEFAULT_PROJECTS_URL,
};
pub use driver::{is_png, Driver, PNG_SIGNATURE};
pub use failure::{names as artifact_names, ArtifactCapture, FailureHook};
pub use locator::{Locator, Query, Strategy};
pub use login::LoginPage;
pub use mock_driver::{
    ClickHandler, Change, DemoSite, Effect, ElementId, MockDocument, MockDriver, MockElement,
    MockHandle, MockPage,
};
pub use page_object::{BasePage, PageObject};
pub use reporter::{FailureMode, Reporter, TestResultEntry, TestStatus};
pub use result::{ensure, DriverError, DriverResult, PageCheckError, PageCheckResult};
pub use runner::{ScenarioOutcome, ScenarioRunner};
pub use scenarios::Scenario;
pub use session::{DriverSession, SessionState};
pub use wait::{poll_until, wait_until, WaitOptions, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        ensure, BasePage, Driver, LoginPage, Locator, PageCheckError, PageCheckResult,
        PageObject, SuiteConfig, WaitOptions,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_covers_a_login() {
        use crate::prelude::*;

        fn open_login<D: Driver>(driver: &mut D, config: &SuiteConfig) -> PageCheckResult<bool> {
            let mut page = LoginPage::new(driver, config);
            let _ = page.open()?;
            page.is_current()
        }

        let site = DemoSite::default();
        let config = SuiteConfig {
            login_url: site.login_url.clone(),
            projects_url: site.projects_url.clone(),
            ..SuiteConfig::default()
        };
        assert!(open_login(&mut site.driver(), &config).unwrap());
    }

    #[test]
    fn test_suite_has_eight_scenarios() {
        assert_eq!(scenarios::all::<MockDriver>().len(), 8);
    }
}
