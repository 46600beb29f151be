//! Property-based tests for page-object behavior

#![allow(clippy::expect_used, clippy::unwrap_used)]

use pagecheck::{
    wait_until, DemoSite, Driver, LoginPage, MockDriver, PageCheckError, SuiteConfig, WaitOptions,
};
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn demo_config(site: &DemoSite) -> SuiteConfig {
    SuiteConfig {
        login_url: site.login_url.clone(),
        projects_url: site.projects_url.clone(),
        poll_interval_ms: 5,
        ..SuiteConfig::default()
    }
}

fn credential() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9@._-]{0,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_login_equals_individual_steps(email in credential(), password in credential()) {
        let site = DemoSite::default();
        let config = demo_config(&site);

        let mut chained = site.driver();
        {
            let mut page = LoginPage::new(&mut chained, &config);
            page.open().unwrap().login(&email, &password).unwrap();
        }

        let mut stepwise = site.driver();
        {
            let mut page = LoginPage::new(&mut stepwise, &config);
            page.open().unwrap();
            page.enter_email(&email).unwrap();
            page.enter_password(&password).unwrap();
            page.click_login_button().unwrap();
        }

        prop_assert_eq!(chained.actions(), stepwise.actions());
    }

    #[test]
    fn prop_login_and_projects_pages_are_exclusive(
        login_segment in "[a-z]{1,8}",
        project_segment in "[a-z]{1,8}",
        on_login in any::<bool>(),
    ) {
        let config = SuiteConfig {
            login_url: format!("https://site.test/{login_segment}"),
            projects_url: format!("https://site.test/app/projects/{project_segment}"),
            projects_path: "/app/projects".to_string(),
            ..SuiteConfig::default()
        };
        let target = if on_login { config.login_url.clone() } else { config.projects_url.clone() };

        let mut driver = MockDriver::new();
        driver.navigate(&target).unwrap();
        let mut page = LoginPage::new(&mut driver, &config);

        let login = page.is_on_login_page().unwrap();
        let projects = page.is_on_projects_page().unwrap();
        prop_assert!(!(login && projects));
        prop_assert_eq!(login, on_login);
        prop_assert_eq!(projects, !on_login);
        prop_assert_eq!(page.has_redirected_from_login().unwrap(), !on_login);
    }

    #[test]
    fn prop_wait_never_returns_before_timeout(timeout_ms in 1u64..40, poll_ms in 1u64..15) {
        let options = WaitOptions::new()
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_poll_interval(Duration::from_millis(poll_ms));
        let start = Instant::now();
        let mut probes = 0u32;

        let err = wait_until(&options, "never", || {
            probes += 1;
            Ok(false)
        })
        .unwrap_err();

        prop_assert!(start.elapsed() >= Duration::from_millis(timeout_ms));
        prop_assert!(probes >= 1);
        let is_timeout = matches!(err, PageCheckError::Timeout { ms, .. } if ms == timeout_ms);
        prop_assert!(is_timeout);
    }
}
