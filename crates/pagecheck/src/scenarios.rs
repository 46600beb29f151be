//! The login suite.
//!
//! Each scenario is a plain function over a driver and the suite config,
//! so the CLI and `cargo test` run the same code. Credentials are the
//! fixed fixtures of the site under test.

use crate::attachment::{Severity, TestMetadata};
use crate::config::SuiteConfig;
use crate::driver::Driver;
use crate::login::LoginPage;
use crate::result::{ensure, PageCheckResult};

/// Accepted test account
pub const VALID_EMAIL: &str = "test@example.com";
/// Password of the test account
pub const VALID_PASSWORD: &str = "password";
/// Email with no account
pub const INVALID_EMAIL: &str = "wrong@example.com";
/// Password that never matches
pub const INVALID_PASSWORD: &str = "wrongpassword";

const EPIC: &str = "Authentication";
const FEATURE: &str = "Login page";

/// Scenario body signature
pub type ScenarioFn<D> = fn(&mut D, &SuiteConfig) -> PageCheckResult<()>;

/// A named scenario with its report labels
pub struct Scenario<D: Driver> {
    /// Stable identifier
    pub name: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// Story label
    pub story: &'static str,
    /// Severity label
    pub severity: Severity,
    /// Scenario body
    pub body: ScenarioFn<D>,
}

impl<D: Driver> std::fmt::Debug for Scenario<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Scenario<D> {
    /// Report labels for this scenario
    #[must_use]
    pub fn metadata(&self) -> TestMetadata {
        TestMetadata::titled(self.title)
            .in_story(EPIC, FEATURE, self.story)
            .with_severity(self.severity)
    }

    /// Run the body directly, without a runner
    ///
    /// # Errors
    ///
    /// Returns the scenario's failure
    pub fn execute(&self, driver: &mut D, config: &SuiteConfig) -> PageCheckResult<()> {
        (self.body)(driver, config)
    }
}

/// Every scenario of the suite, in execution order
#[must_use]
pub fn all<D: Driver>() -> Vec<Scenario<D>> {
    vec![
        Scenario {
            name: "successful_login",
            title: "Successful login with valid credentials",
            story: "Successful login",
            severity: Severity::Critical,
            body: successful_login,
        },
        Scenario {
            name: "successful_login_url_check",
            title: "URL after successful login",
            story: "Successful login",
            severity: Severity::Normal,
            body: successful_login_url_check,
        },
        Scenario {
            name: "invalid_credentials",
            title: "Login with invalid credentials",
            story: "Failed login",
            severity: Severity::Normal,
            body: invalid_credentials,
        },
        Scenario {
            name: "empty_fields",
            title: "Login with empty fields",
            story: "Form validation",
            severity: Severity::Minor,
            body: empty_fields,
        },
        Scenario {
            name: "page_elements_present",
            title: "Login form elements are present",
            story: "Page structure",
            severity: Severity::Normal,
            body: page_elements_present,
        },
        Scenario {
            name: "page_elements_visible",
            title: "Login form elements are visible",
            story: "Page structure",
            severity: Severity::Normal,
            body: page_elements_visible,
        },
        Scenario {
            name: "empty_email",
            title: "Login with empty email",
            story: "Form validation",
            severity: Severity::Minor,
            body: empty_email,
        },
        Scenario {
            name: "empty_password",
            title: "Login with empty password",
            story: "Form validation",
            severity: Severity::Minor,
            body: empty_password,
        },
    ]
}

/// Scenarios whose name contains `filter`
#[must_use]
pub fn matching<D: Driver>(filter: &str) -> Vec<Scenario<D>> {
    all().into_iter().filter(|s| s.name.contains(filter)).collect()
}

/// Valid credentials reach the projects page
///
/// # Errors
///
/// Fails if the redirect never happens or lands elsewhere
pub fn successful_login<D: Driver>(driver: &mut D, config: &SuiteConfig) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?.login(VALID_EMAIL, VALID_PASSWORD)?;
    let _ = page.wait_for_successful_login(config.default_timeout())?;
    ensure(
        page.is_login_successful()?,
        "redirect to the projects page did not happen",
    )?;
    ensure(page.is_on_projects_page()?, "not on the projects page")
}

/// The post-login URL carries the projects path
///
/// # Errors
///
/// Fails naming the expected fragment and the actual URL
pub fn successful_login_url_check<D: Driver>(
    driver: &mut D,
    config: &SuiteConfig,
) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page
        .open()?
        .login_and_wait(VALID_EMAIL, VALID_PASSWORD, config.default_timeout())?;
    let current = page.get_current_url()?;
    ensure(
        current.contains(&config.projects_path),
        format!(
            "expected URL containing '{}', got: {current}",
            config.projects_path
        ),
    )
}

/// Invalid credentials keep the user on the login page or show an error
///
/// # Errors
///
/// Fails if neither outcome is observed
pub fn invalid_credentials<D: Driver>(driver: &mut D, config: &SuiteConfig) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?.login(INVALID_EMAIL, INVALID_PASSWORD)?;
    let stayed = page.is_on_login_page()?;
    ensure(
        stayed || page.has_error_message()?,
        format!(
            "expected to stay on the login page or see an error, but the browser is at {}",
            page.get_current_url()?
        ),
    )
}

/// Submitting an empty form does not navigate
///
/// # Errors
///
/// Fails if the browser left the login page
pub fn empty_fields<D: Driver>(driver: &mut D, config: &SuiteConfig) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?.click_login_button()?;
    stays_on_login(&mut page, "empty fields")
}

/// Email, password and submit are in the DOM
///
/// # Errors
///
/// Fails naming the missing element
pub fn page_elements_present<D: Driver>(
    driver: &mut D,
    config: &SuiteConfig,
) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?;
    ensure(page.is_email_field_present()?, "email field is missing")?;
    ensure(page.is_password_field_present()?, "password field is missing")?;
    ensure(page.is_login_button_present()?, "login button is missing")
}

/// Email, password and submit are visible
///
/// # Errors
///
/// Fails if any of them is hidden
pub fn page_elements_visible<D: Driver>(
    driver: &mut D,
    config: &SuiteConfig,
) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?;
    ensure(
        page.are_all_elements_visible()?,
        "not all login form elements are visible",
    )
}

/// A password alone does not log in
///
/// # Errors
///
/// Fails if the browser left the login page
pub fn empty_email<D: Driver>(driver: &mut D, config: &SuiteConfig) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?.enter_password(VALID_PASSWORD)?.click_login_button()?;
    stays_on_login(&mut page, "empty email")
}

/// An email alone does not log in
///
/// # Errors
///
/// Fails if the browser left the login page
pub fn empty_password<D: Driver>(driver: &mut D, config: &SuiteConfig) -> PageCheckResult<()> {
    let mut page = LoginPage::new(driver, config);
    let _ = page.open()?.enter_email(VALID_EMAIL)?.click_login_button()?;
    stays_on_login(&mut page, "empty password")
}

fn stays_on_login<D: Driver>(page: &mut LoginPage<'_, D>, case: &str) -> PageCheckResult<()> {
    ensure(
        page.is_on_login_page()?,
        format!(
            "expected to stay on the login page with {case}, but the browser is at {}",
            page.get_current_url()?
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_driver::{DemoSite, MockDriver};
    use std::collections::HashSet;

    #[test]
    fn test_eight_unique_scenarios() {
        let scenarios = all::<MockDriver>();
        assert_eq!(scenarios.len(), 8);
        let names: HashSet<&str> = scenarios.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_metadata_labels() {
        let scenario = &all::<MockDriver>()[0];
        let meta = scenario.metadata();
        assert_eq!(meta.epic, "Authentication");
        assert_eq!(meta.feature, "Login page");
        assert_eq!(meta.severity, Severity::Critical);
    }

    #[test]
    fn test_matching_filter() {
        let names: Vec<&str> = matching::<MockDriver>("empty").iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["empty_fields", "empty_email", "empty_password"]);
        assert!(matching::<MockDriver>("nothing").is_empty());
    }

    #[test]
    fn test_every_scenario_passes_against_demo_site() {
        let site = DemoSite::default();
        let config = SuiteConfig {
            login_url: site.login_url.clone(),
            projects_url: site.projects_url.clone(),
            default_timeout_secs: 2,
            poll_interval_ms: 10,
            ..SuiteConfig::default()
        };
        for scenario in all::<MockDriver>() {
            let mut driver = site.driver();
            scenario
                .execute(&mut driver, &config)
                .unwrap_or_else(|e| panic!("{} failed: {e}", scenario.name));
        }
    }

    #[test]
    fn test_successful_login_times_out_for_unknown_account() {
        let site = DemoSite {
            valid_email: String::new(),
            ..DemoSite::default()
        };
        let config = SuiteConfig {
            login_url: site.login_url.clone(),
            projects_url: site.projects_url.clone(),
            default_timeout_secs: 1,
            poll_interval_ms: 10,
            ..SuiteConfig::default()
        };
        let mut driver = site.driver();
        let err = successful_login(&mut driver, &config).unwrap_err();
        assert!(err.is_timeout());
    }
}
