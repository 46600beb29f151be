//! Login page object.
//!
//! Login-specific workflow composed from [`BasePage`] primitives, plus the
//! outcome predicates the scenarios assert on. The page keeps no state of
//! its own: whether a submitted login succeeded is decided by polling the
//! driver's current URL.

use crate::config::SuiteConfig;
use crate::driver::Driver;
use crate::page_object::{BasePage, PageObject};
use crate::registry::login;
use crate::result::PageCheckResult;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tracing::info;

/// Page object for the login form
#[derive(Debug)]
pub struct LoginPage<'a, D: Driver> {
    base: BasePage<'a, D>,
    login_url: String,
    projects_url: String,
    projects_path: String,
}

impl<'a, D: Driver> Deref for LoginPage<'a, D> {
    type Target = BasePage<'a, D>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<D: Driver> DerefMut for LoginPage<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

fn same_page(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

impl<'a, D: Driver> LoginPage<'a, D> {
    /// Login page for the URLs and wait options in `config`
    pub fn new(driver: &'a mut D, config: &SuiteConfig) -> Self {
        Self {
            base: BasePage::with_wait(driver, config.wait_options()),
            login_url: config.login_url.clone(),
            projects_url: config.projects_url.clone(),
            projects_path: config.projects_path.clone(),
        }
    }

    /// Login form URL
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Navigate to the login form
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    pub fn open(&mut self) -> PageCheckResult<&mut Self> {
        let url = self.login_url.clone();
        let _ = self.base.open(&url)?;
        Ok(self)
    }

    /// Type into the email field
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundTimeout`](crate::PageCheckError::NotFoundTimeout)
    /// if the field never appears
    pub fn enter_email(&mut self, email: &str) -> PageCheckResult<&mut Self> {
        let _ = self.base.enter_text(&login::EMAIL_INPUT, email)?;
        Ok(self)
    }

    /// Type into the password field
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundTimeout`](crate::PageCheckError::NotFoundTimeout)
    /// if the field never appears
    pub fn enter_password(&mut self, password: &str) -> PageCheckResult<&mut Self> {
        let _ = self.base.enter_text(&login::PASSWORD_INPUT, password)?;
        Ok(self)
    }

    /// Click the submit control
    ///
    /// # Errors
    ///
    /// Returns [`NotClickableTimeout`](crate::PageCheckError::NotClickableTimeout)
    /// if the button never becomes clickable
    pub fn click_login_button(&mut self) -> PageCheckResult<&mut Self> {
        let _ = self.base.click_element(&login::LOGIN_BUTTON)?;
        Ok(self)
    }

    /// Enter both credentials and submit, in that order
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error
    pub fn login(&mut self, email: &str, password: &str) -> PageCheckResult<&mut Self> {
        info!(email, "submit login form");
        self.enter_email(email)?
            .enter_password(password)?
            .click_login_button()
    }

    /// [`login`](Self::login), then wait for the projects page
    ///
    /// # Errors
    ///
    /// Returns [`NavigationTimeout`](crate::PageCheckError::NavigationTimeout)
    /// if the redirect does not happen within `timeout`
    pub fn login_and_wait(
        &mut self,
        email: &str,
        password: &str,
        timeout: Duration,
    ) -> PageCheckResult<&mut Self> {
        self.login(email, password)?
            .wait_for_successful_login(timeout)
    }

    /// Current URL equals the login URL, ignoring a trailing slash
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report its URL
    pub fn is_on_login_page(&mut self) -> PageCheckResult<bool> {
        let current = self.base.get_current_url()?;
        Ok(same_page(&current, &self.login_url))
    }

    /// Current URL contains the projects URL or the post-login path
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report its URL
    pub fn is_on_projects_page(&mut self) -> PageCheckResult<bool> {
        let current = self.base.get_current_url()?;
        let on_url = !self.projects_url.is_empty() && current.contains(&self.projects_url);
        let on_path = !self.projects_path.is_empty() && current.contains(&self.projects_path);
        Ok(on_url || on_path)
    }

    /// The browser left the login form
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report its URL
    pub fn has_redirected_from_login(&mut self) -> PageCheckResult<bool> {
        Ok(!self.is_on_login_page()?)
    }

    /// Same as [`is_on_projects_page`](Self::is_on_projects_page)
    ///
    /// # Errors
    ///
    /// Returns error if the driver cannot report its URL
    pub fn is_login_successful(&mut self) -> PageCheckResult<bool> {
        self.is_on_projects_page()
    }

    /// Whether an error message is shown right now
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn has_error_message(&mut self) -> PageCheckResult<bool> {
        self.base.is_element_present(&login::ERROR_MESSAGE)
    }

    /// Text of the error message, waiting for it to appear
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundTimeout`](crate::PageCheckError::NotFoundTimeout)
    /// if no error message appears
    pub fn get_error_message_text(&mut self) -> PageCheckResult<String> {
        self.base.get_text(&login::ERROR_MESSAGE)
    }

    /// Wait until the URL moves away from the login URL
    ///
    /// # Errors
    ///
    /// Returns [`NavigationTimeout`](crate::PageCheckError::NavigationTimeout)
    /// if no redirect happens within `timeout`
    pub fn wait_for_redirect(&mut self, timeout: Duration) -> PageCheckResult<&mut Self> {
        let baseline = self.login_url.clone();
        let _ = self.base.wait_for_url_change(&baseline, timeout)?;
        Ok(self)
    }

    /// Wait until the URL contains the post-login path
    ///
    /// # Errors
    ///
    /// Returns [`NavigationTimeout`](crate::PageCheckError::NavigationTimeout)
    /// naming the expected fragment and the last URL seen
    pub fn wait_for_successful_login(&mut self, timeout: Duration) -> PageCheckResult<&mut Self> {
        let path = self.projects_path.clone();
        let expected = format!("URL containing '{path}'");
        let url = self
            .base
            .wait_for_url(&expected, timeout, |url| url.contains(path.as_str()))?;
        info!(url = %url, "login completed");
        Ok(self)
    }

    /// Whether the email field is present right now
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn is_email_field_present(&mut self) -> PageCheckResult<bool> {
        self.base.is_element_present(&login::EMAIL_INPUT)
    }

    /// Whether the password field is present right now
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn is_password_field_present(&mut self) -> PageCheckResult<bool> {
        self.base.is_element_present(&login::PASSWORD_INPUT)
    }

    /// Whether the submit control is present right now
    ///
    /// # Errors
    ///
    /// Returns error if the driver query fails
    pub fn is_login_button_present(&mut self) -> PageCheckResult<bool> {
        self.base.is_element_present(&login::LOGIN_BUTTON)
    }

    /// Email, password and submit are all visible; stops at the first that
    /// is not
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundTimeout`](crate::PageCheckError::NotFoundTimeout)
    /// if one of them is missing altogether
    pub fn are_all_elements_visible(&mut self) -> PageCheckResult<bool> {
        for locator in [login::EMAIL_INPUT, login::PASSWORD_INPUT, login::LOGIN_BUTTON] {
            if !self.base.is_element_visible(&locator)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<D: Driver> PageObject for LoginPage<'_, D> {
    fn url_pattern(&self) -> &str {
        &self.login_url
    }

    fn is_current(&mut self) -> PageCheckResult<bool> {
        self.is_on_login_page()
    }

    fn page_name(&self) -> &'static str {
        "login"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_driver::{DemoSite, MockDriver};
    use crate::result::PageCheckError;

    fn site() -> DemoSite {
        DemoSite {
            redirect_delay: Duration::from_millis(30),
            ..DemoSite::default()
        }
    }

    fn config_for(site: &DemoSite) -> SuiteConfig {
        SuiteConfig {
            login_url: site.login_url.clone(),
            projects_url: site.projects_url.clone(),
            default_timeout_secs: 1,
            poll_interval_ms: 10,
            ..SuiteConfig::default()
        }
    }

    mod url_predicate_tests {
        use super::*;

        #[test]
        fn test_login_url_trailing_slash_insensitive() {
            assert!(same_page("https://a.test/", "https://a.test"));
            assert!(same_page("https://a.test", "https://a.test/"));
            assert!(!same_page("https://a.test/x", "https://a.test/"));
        }

        #[test]
        fn test_on_login_page_after_open() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap();
            assert!(page.is_on_login_page().unwrap());
            assert!(page.is_current().unwrap());
            assert!(!page.is_on_projects_page().unwrap());
            assert!(!page.has_redirected_from_login().unwrap());
            assert_eq!(page.page_name(), "login");
        }

        #[test]
        fn test_empty_projects_url_never_matches_login_page() {
            let site = site();
            let config = SuiteConfig {
                projects_url: String::new(),
                ..config_for(&site)
            };
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap();
            assert!(page.is_on_login_page().unwrap());
            assert!(!page.is_on_projects_page().unwrap());
            assert!(!page.is_login_successful().unwrap());
        }

        #[test]
        fn test_projects_path_matches_anywhere() {
            let site = site();
            let config = config_for(&site);
            let mut driver = MockDriver::new();
            driver.navigate("https://other.test/lk/projects?id=4").unwrap();
            let mut page = LoginPage::new(&mut driver, &config);
            assert!(page.is_on_projects_page().unwrap());
            assert!(page.is_login_successful().unwrap());
        }
    }

    mod flow_tests {
        use super::*;

        #[test]
        fn test_form_elements_present_and_visible() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap();
            assert!(page.is_email_field_present().unwrap());
            assert!(page.is_password_field_present().unwrap());
            assert!(page.is_login_button_present().unwrap());
            assert!(page.are_all_elements_visible().unwrap());
        }

        #[test]
        fn test_valid_login_redirects() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page
                .open()
                .unwrap()
                .login_and_wait(&site.valid_email, &site.valid_password, Duration::from_secs(1))
                .unwrap();
            assert!(page.is_login_successful().unwrap());
            assert!(page.get_current_url().unwrap().contains("/lk/projects"));
        }

        #[test]
        fn test_wait_for_redirect() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap();
            let _ = page.login(&site.valid_email, &site.valid_password).unwrap();
            let _ = page.wait_for_redirect(Duration::from_secs(1)).unwrap();
            assert!(page.has_redirected_from_login().unwrap());
        }

        #[test]
        fn test_invalid_login_shows_error() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap();
            let _ = page.login("wrong@example.com", "wrongpassword").unwrap();
            let text = page.get_error_message_text().unwrap();
            assert!(!text.is_empty());
            assert!(page.has_error_message().unwrap());
            assert!(page.is_on_login_page().unwrap());
        }

        #[test]
        fn test_failed_login_wait_names_fragment_and_url() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap();
            let err = page
                .login_and_wait("wrong@example.com", "nope", Duration::from_millis(100))
                .unwrap_err();
            match err {
                PageCheckError::NavigationTimeout { expected, actual, .. } => {
                    assert!(expected.contains("/lk/projects"));
                    assert!(same_page(&actual, &site.login_url));
                }
                other => panic!("expected NavigationTimeout, got {other:?}"),
            }
        }

        #[test]
        fn test_empty_submit_stays_on_login() {
            let site = site();
            let config = config_for(&site);
            let mut driver = site.driver();
            let mut page = LoginPage::new(&mut driver, &config);
            let _ = page.open().unwrap().click_login_button().unwrap();
            std::thread::sleep(Duration::from_millis(60));
            assert!(page.is_on_login_page().unwrap());
        }
    }
}
