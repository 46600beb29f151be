//! Reporter - scenario results and report rendering
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ScenarioRunner ──► TestResultEntry ──► Reporter                  │
//! │                     (status, metadata,    │                       │
//! │                      attachments)         ├─► summary()           │
//! │                                           ├─► render_json()       │
//! │                                           ├─► render_html()       │
//! │                                           └─► render_junit()      │
//! │                                                                   │
//! │  FailureMode::StopOnFirst    stop the run on the first failure    │
//! │  FailureMode::CollectAll     run everything (default)             │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use crate::attachment::{Attachment, AttachmentKind, TestMetadata};
use crate::result::{PageCheckError, PageCheckResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// What the reporter does after a failed result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop the run at the first failure
    StopOnFirst,
    /// Record every result
    #[default]
    CollectAll,
}

/// Test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Scenario body succeeded
    Passed,
    /// Scenario body failed
    Failed,
    /// Setup failed before the body ran
    Broken,
    /// Scenario was not run
    Skipped,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Failed or broken
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed | Self::Broken)
    }

    /// Lowercase label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Broken => "broken",
            Self::Skipped => "skipped",
        }
    }
}

/// Individual scenario result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultEntry {
    /// Scenario identifier
    pub name: String,
    /// Descriptive metadata
    pub metadata: TestMetadata,
    /// Test status
    pub status: TestStatus,
    /// Duration of scenario execution
    pub duration: Duration,
    /// Failure or skip reason
    pub error: Option<String>,
    /// Diagnostics captured on failure
    pub attachments: Vec<Attachment>,
    /// When the scenario started
    pub started_at: SystemTime,
}

impl TestResultEntry {
    fn new(name: impl Into<String>, status: TestStatus, duration: Duration) -> Self {
        Self {
            name: name.into(),
            metadata: TestMetadata::default(),
            status,
            duration,
            error: None,
            attachments: Vec::new(),
            started_at: SystemTime::now()
                .checked_sub(duration)
                .unwrap_or_else(SystemTime::now),
        }
    }

    /// Create a passing test result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, TestStatus::Passed, duration)
    }

    /// Create a failing test result
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(name, TestStatus::Failed, duration)
        }
    }

    /// Create a result for a scenario whose setup failed
    #[must_use]
    pub fn broken(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(name, TestStatus::Broken, duration)
        }
    }

    /// Create a skipped test result
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::new(name, TestStatus::Skipped, Duration::ZERO)
        }
    }

    /// Attach metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: TestMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach diagnostics
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Title from the metadata, falling back to the name
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.metadata.title.is_empty() {
            &self.name
        } else {
            &self.metadata.title
        }
    }

    /// Start time in epoch milliseconds
    #[must_use]
    pub fn start_millis(&self) -> u64 {
        epoch_millis(self.started_at)
    }

    /// Stop time in epoch milliseconds
    #[must_use]
    pub fn stop_millis(&self) -> u64 {
        epoch_millis(self.started_at + self.duration)
    }
}

fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Collected results of one run
#[derive(Debug, Default)]
pub struct Reporter {
    results: Vec<TestResultEntry>,
    failure_mode: FailureMode,
    suite_name: String,
}

impl Reporter {
    /// Create new reporter in [`FailureMode::CollectAll`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            suite_name: "Login suite".to_string(),
            ..Default::default()
        }
    }

    /// Create a reporter that stops at the first failure
    #[must_use]
    pub fn stop_on_first() -> Self {
        Self {
            failure_mode: FailureMode::StopOnFirst,
            ..Self::new()
        }
    }

    /// Set suite name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    /// Failure mode
    #[must_use]
    pub const fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Record a result
    ///
    /// # Errors
    ///
    /// In [`FailureMode::StopOnFirst`], returns an error for a failed result
    /// after recording it
    pub fn record(&mut self, result: TestResultEntry) -> PageCheckResult<()> {
        let failure = result
            .status
            .is_failed()
            .then(|| (result.name.clone(), result.error.clone().unwrap_or_default()));

        self.results.push(result);

        if self.failure_mode == FailureMode::StopOnFirst {
            if let Some((name, error)) = failure {
                return Err(PageCheckError::assertion(format!(
                    "stopping after first failure: '{name}' failed: {error}"
                )));
            }
        }
        Ok(())
    }

    /// Get number of passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::is_passed)
    }

    /// Failed and broken tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(TestStatus::is_failed)
    }

    /// Get number of skipped tests
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|s| *s == TestStatus::Skipped)
    }

    fn count(&self, predicate: impl Fn(&TestStatus) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.status)).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.results.len() as f64
    }

    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Get test results
    #[must_use]
    pub fn results(&self) -> &[TestResultEntry] {
        &self.results
    }

    /// Get failing tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.results
            .iter()
            .filter(|r| r.status.is_failed())
            .collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed, {} skipped in {:.2}s",
            self.suite_name,
            self.passed_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64()
        )
    }

    /// Results as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn render_json(&self) -> PageCheckResult<String> {
        let report = serde_json::json!({
            "suite": self.suite_name,
            "passed": self.passed_count(),
            "failed": self.failed_count(),
            "skipped": self.skipped_count(),
            "duration_ms": u64::try_from(self.total_duration().as_millis()).unwrap_or(u64::MAX),
            "results": self.results,
        });
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Write the JSON report
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn generate_json(&self, output_path: &Path) -> PageCheckResult<()> {
        std::fs::write(output_path, self.render_json()?)?;
        Ok(())
    }

    /// Write the HTML report
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn generate_html(&self, output_path: &Path) -> PageCheckResult<()> {
        std::fs::write(output_path, self.render_html())?;
        Ok(())
    }

    /// Self-contained HTML report; screenshots are inlined as data URIs
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>pagecheck report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        .test { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .test.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .test.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .test.skip { background: #fff3e0; border-left: 4px solid #ff9800; }
        .labels { color: #666; font-size: 0.9em; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        details pre { max-height: 300px; overflow: auto; background: #fafafa; }
        .screenshot { max-width: 640px; border: 1px solid #ddd; }
    </style>
</head>
<body>
"#,
        );

        let _ = write!(
            html,
            r#"<div class="summary">
    <h1>{}</h1>
    <h2>{}</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
</div>
"#,
            escape_xml(&self.suite_name),
            escape_xml(&self.summary()),
            self.pass_rate() * 100.0,
        );

        html.push_str("<h2>Scenarios</h2>\n");
        for result in &self.results {
            let class = match result.status {
                TestStatus::Passed => "pass",
                TestStatus::Failed | TestStatus::Broken => "fail",
                TestStatus::Skipped => "skip",
            };
            let _ = writeln!(
                html,
                r#"<div class="test {class}">
    <strong>{}</strong> - {} ({:.2}ms)"#,
                escape_xml(result.display_name()),
                result.status.label(),
                result.duration.as_secs_f64() * 1000.0
            );

            let labels: Vec<String> = result
                .metadata
                .labels()
                .into_iter()
                .map(|(name, value)| format!("{name}: {}", escape_xml(&value)))
                .collect();
            let _ = writeln!(html, r#"    <div class="labels">{}</div>"#, labels.join(" | "));

            if let Some(error) = &result.error {
                let _ = writeln!(html, r#"    <div class="error">{}</div>"#, escape_xml(error));
            }

            for attachment in &result.attachments {
                render_attachment(&mut html, attachment);
            }

            html.push_str("</div>\n");
        }

        html.push_str(
            r#"
<footer>
    <p>Generated by pagecheck</p>
</footer>
</body>
</html>
"#,
        );

        html
    }

    /// Write JUnit XML for CI integration
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn generate_junit(&self, output_path: &Path) -> PageCheckResult<()> {
        std::fs::write(output_path, self.render_junit())?;
        Ok(())
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(
            xml,
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
            escape_xml(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64()
        );

        for result in &self.results {
            let _ = writeln!(
                xml,
                r#"  <testcase name="{}" time="{:.3}">"#,
                escape_xml(&result.name),
                result.duration.as_secs_f64()
            );

            match (result.status, &result.error) {
                (TestStatus::Failed, Some(error)) => {
                    let _ = writeln!(
                        xml,
                        r#"    <failure message="{0}">{0}</failure>"#,
                        escape_xml(error)
                    );
                }
                (TestStatus::Broken, Some(error)) => {
                    let _ = writeln!(
                        xml,
                        r#"    <error message="{0}">{0}</error>"#,
                        escape_xml(error)
                    );
                }
                (TestStatus::Skipped, _) => xml.push_str("    <skipped/>\n"),
                _ => {}
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

fn render_attachment(html: &mut String, attachment: &Attachment) {
    let name = escape_xml(&attachment.name);
    match attachment.kind {
        AttachmentKind::Png => {
            let _ = writeln!(
                html,
                r#"    <details open><summary>{name}</summary><img class="screenshot" alt="{name}" src="data:image/png;base64,{}"></details>"#,
                STANDARD.encode(&attachment.body)
            );
        }
        AttachmentKind::Text | AttachmentKind::Html => {
            let _ = writeln!(
                html,
                r"    <details><summary>{name}</summary><pre>{}</pre></details>",
                escape_xml(&attachment.text())
            );
        }
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
