//! Failure hooks: diagnostics captured when a scenario body fails.
//!
//! Hooks observe a failure after the fact. They never change the outcome:
//! a capture that itself fails is logged and dropped so the original
//! failure stays the one reported.

use crate::attachment::{AttachmentKind, ReportSink};
use crate::driver::Driver;
use crate::result::PageCheckResult;
use chrono::Local;
use tracing::{debug, warn};

/// Callback run by the scenario runner after a failed call phase
pub trait FailureHook<D: Driver> {
    /// Inspect the failure. `driver` is `None` when no live session exists.
    fn on_failure(&self, driver: Option<&mut D>, failure: &str, sink: &mut dyn ReportSink);
}

/// Attachment names used by [`ArtifactCapture`]
pub mod names {
    /// Prefix of the timestamped screenshot name
    pub const SCREENSHOT_PREFIX: &str = "screenshot_on_failure_";
    /// URL at the time of the failure
    pub const CURRENT_URL: &str = "url_on_failure";
    /// Page markup at the time of the failure
    pub const PAGE_SOURCE: &str = "page_source";
}

/// Attaches a screenshot, the current URL and the page markup
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactCapture;

impl ArtifactCapture {
    /// Create the hook
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// `screenshot_on_failure_<YYYYmmdd_HHMMSS>`
    #[must_use]
    pub fn screenshot_name() -> String {
        format!(
            "{}{}",
            names::SCREENSHOT_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }

    fn capture<D: Driver>(driver: &mut D, sink: &mut dyn ReportSink) {
        let screenshot = driver
            .screenshot()
            .map_err(Into::into)
            .and_then(|png| sink.attach(&Self::screenshot_name(), &png, AttachmentKind::Png));
        log_capture("screenshot", screenshot);

        let url = driver
            .current_url()
            .map_err(Into::into)
            .and_then(|url| sink.attach(names::CURRENT_URL, url.as_bytes(), AttachmentKind::Text));
        log_capture("current url", url);

        let source = driver
            .page_source()
            .map_err(Into::into)
            .and_then(|html| sink.attach(names::PAGE_SOURCE, html.as_bytes(), AttachmentKind::Html));
        log_capture("page source", source);
    }
}

fn log_capture(artifact: &str, result: PageCheckResult<()>) {
    match result {
        Ok(()) => debug!(artifact, "attached failure artifact"),
        Err(err) => warn!(artifact, error = %err, "could not capture failure artifact"),
    }
}

impl<D: Driver> FailureHook<D> for ArtifactCapture {
    fn on_failure(&self, driver: Option<&mut D>, failure: &str, sink: &mut dyn ReportSink) {
        match driver {
            Some(driver) => {
                debug!(failure, "capturing failure artifacts");
                Self::capture(driver, sink);
            }
            None => debug!(failure, "no driver session; skipping artifact capture"),
        }
    }
}
