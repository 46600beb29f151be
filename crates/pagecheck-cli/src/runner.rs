//! Suite runner: scenarios in order, results on disk, progress on screen

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use pagecheck::{
    ArtifactCapture, Driver, PageCheckResult, Reporter, ResultsDirectory, Scenario,
    ScenarioRunner, SuiteConfig,
};
use std::path::PathBuf;
use tracing::info;

/// File names of the generated reports
pub mod report_files {
    /// Self-contained HTML report
    pub const HTML: &str = "report.html";
    /// Machine-readable results
    pub const JSON: &str = "report.json";
    /// JUnit XML for CI
    pub const JUNIT: &str = "junit.xml";
}

/// Runs suite scenarios for the CLI
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a new suite runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run `scenarios` in order, each against a fresh driver from `launch`.
    ///
    /// Every result is written to the suite's results directory as soon as
    /// it is known. With fail-fast, the run stops after the first failed
    /// or broken scenario.
    ///
    /// # Errors
    ///
    /// Returns error if the results directory cannot be created or written
    pub fn run<D, L>(
        &mut self,
        suite: &SuiteConfig,
        scenarios: &[Scenario<D>],
        launch: L,
    ) -> CliResult<Reporter>
    where
        D: Driver,
        L: Fn() -> PageCheckResult<D>,
    {
        let results = ResultsDirectory::create(&suite.results_dir)?;
        let runner = ScenarioRunner::new().with_hook(ArtifactCapture::new());
        let mut report = if self.config.fail_fast {
            Reporter::stop_on_first()
        } else {
            Reporter::new()
        }
        .with_name("Login page");

        self.reporter.header("Login page scenarios");
        self.reporter
            .start_progress(scenarios.len() as u64, "starting");

        for scenario in scenarios {
            self.reporter.set_message(scenario.name);
            let entry = runner.run_scenario(scenario, suite, &launch);
            let _ = results.write(&entry)?;
            self.reporter.scenario(&entry);
            self.reporter.increment(1);
            if let Err(stop) = report.record(entry) {
                self.reporter.warning(&stop.to_string());
                break;
            }
        }

        self.reporter.finish();
        self.reporter.summary(
            report.passed_count(),
            report.failed_count(),
            report.skipped_count(),
            report.total_duration(),
        );
        info!(
            results_dir = %results.path().display(),
            summary = %report.summary(),
            "suite finished"
        );
        Ok(report)
    }

    /// Write the HTML, JSON and JUnit reports into the output directory
    ///
    /// # Errors
    ///
    /// Returns error if a report cannot be written
    pub fn write_reports(&self, report: &Reporter) -> CliResult<Vec<PathBuf>> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir)?;

        let html = dir.join(report_files::HTML);
        let json = dir.join(report_files::JSON);
        let junit = dir.join(report_files::JUNIT);
        report
            .generate_html(&html)
            .and_then(|()| report.generate_json(&json))
            .and_then(|()| report.generate_junit(&junit))
            .map_err(|e| CliError::report_generation(e.to_string()))?;

        for path in [&html, &json, &junit] {
            self.reporter.info(&format!("wrote {}", path.display()));
        }
        Ok(vec![html, json, junit])
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, Verbosity};
    use pagecheck::{scenarios, DemoSite, MockDriver, TestStatus};
    use std::time::Duration;

    fn quiet_config(output: &std::path::Path) -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::Quiet)
            .with_color(ColorChoice::Never)
            .with_output_dir(output)
    }

    fn suite_for(site: &DemoSite, results_dir: PathBuf) -> SuiteConfig {
        SuiteConfig {
            login_url: site.login_url.clone(),
            projects_url: site.projects_url.clone(),
            default_timeout_secs: 1,
            poll_interval_ms: 10,
            results_dir,
            ..SuiteConfig::default()
        }
    }

    #[test]
    fn test_runs_suite_and_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let site = DemoSite::default();
        let suite = suite_for(&site, dir.path().join("allure-results"));
        let mut runner = SuiteRunner::new(quiet_config(&dir.path().join("reports")));

        let report = runner
            .run(&suite, &scenarios::all::<MockDriver>(), || Ok(site.driver()))
            .unwrap();
        assert_eq!(report.total_count(), 8);
        assert!(report.all_passed(), "{}", report.summary());
        assert_eq!(std::fs::read_dir(&suite.results_dir).unwrap().count(), 8);

        let written = runner.write_reports(&report).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_fail_fast_stops_after_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let site = DemoSite {
            redirect_delay: Duration::from_secs(30),
            ..DemoSite::default()
        };
        let suite = suite_for(&site, dir.path().join("allure-results"));
        let mut runner =
            SuiteRunner::new(quiet_config(dir.path()).with_fail_fast(true));

        let report = runner
            .run(&suite, &scenarios::all::<MockDriver>(), || Ok(site.driver()))
            .unwrap();
        assert_eq!(report.total_count(), 1);
        assert_eq!(report.results()[0].status, TestStatus::Failed);
        // result json plus screenshot, url and page source
        assert_eq!(std::fs::read_dir(&suite.results_dir).unwrap().count(), 4);
    }

    #[test]
    fn test_launch_failure_marks_every_scenario_broken() {
        let dir = tempfile::tempdir().unwrap();
        let site = DemoSite::default();
        let suite = suite_for(&site, dir.path().join("allure-results"));
        let mut runner = SuiteRunner::new(quiet_config(dir.path()));

        let report = runner
            .run(&suite, &scenarios::all::<MockDriver>(), || {
                Err(pagecheck::DriverError::Launch {
                    message: "chromium not found".to_string(),
                }
                .into())
            })
            .unwrap();
        assert_eq!(report.failed_count(), 8);
        assert!(report
            .results()
            .iter()
            .all(|r| r.status == TestStatus::Broken));
    }
}
