//! Locator registry: named element locators per logical page.
//!
//! Pure configuration. Fragments are listed most-specific-first, but the
//! driver decides which element matches first.

use crate::locator::Locator;

/// Login form
pub mod login {
    use super::Locator;

    /// Email field
    pub const EMAIL_INPUT: Locator = Locator::css(
        "email input",
        &["input[type='email']", "input[name='email']", "#email"],
    );

    /// Password field
    pub const PASSWORD_INPUT: Locator = Locator::css(
        "password input",
        &["input[type='password']", "input[name='password']", "#password"],
    );

    /// Submit control
    pub const LOGIN_BUTTON: Locator = Locator::css(
        "login button",
        &[
            "button[type='submit']",
            "input[type='submit']",
            ".login-btn",
            "#login",
        ],
    );

    /// Inline error shown after a rejected login
    pub const ERROR_MESSAGE: Locator = Locator::css(
        "error message",
        &[".error", ".alert-danger", ".error-message"],
    );

    /// Every login locator
    pub const ALL: &[Locator] = &[EMAIL_INPUT, PASSWORD_INPUT, LOGIN_BUTTON, ERROR_MESSAGE];
}

/// Elements shared by every page
pub mod common {
    use super::Locator;

    /// Busy indicator shown while content loads
    pub const LOADING_SPINNER: Locator =
        Locator::css("loading spinner", &[".spinner", ".loading", ".loader"]);

    /// Success notification
    pub const ALERT_SUCCESS: Locator =
        Locator::css("success alert", &[".alert-success", ".success-message"]);

    /// Error notification
    pub const ALERT_ERROR: Locator =
        Locator::css("error alert", &[".alert-danger", ".error-message"]);

    /// Modal dialog container
    pub const MODAL_DIALOG: Locator = Locator::css("modal dialog", &[".modal", ".dialog"]);

    /// Close control of a modal dialog
    pub const CLOSE_BUTTON: Locator = Locator::css(
        "close button",
        &[".close", ".btn-close", "[aria-label='Close']"],
    );

    /// Every common locator
    pub const ALL: &[Locator] = &[
        LOADING_SPINNER,
        ALERT_SUCCESS,
        ALERT_ERROR,
        MODAL_DIALOG,
        CLOSE_BUTTON,
    ];
}

/// Post-login landing page
pub mod dashboard {
    use super::Locator;

    /// User menu
    pub const USER_MENU: Locator =
        Locator::css("user menu", &[".user-menu", ".profile-dropdown"]);

    /// Logout control
    pub const LOGOUT_BUTTON: Locator = Locator::css("logout button", &[".logout", "#logout"]);

    /// Greeting banner
    pub const WELCOME_MESSAGE: Locator =
        Locator::css("welcome message", &[".welcome", ".greeting"]);

    /// Every dashboard locator
    pub const ALL: &[Locator] = &[USER_MENU, LOGOUT_BUTTON, WELCOME_MESSAGE];
}

/// Site navigation
pub mod navigation {
    use super::Locator;

    /// Main menu
    pub const MAIN_MENU: Locator = Locator::css("main menu", &[".main-menu", ".navbar"]);

    /// Link to the home page
    pub const HOME_LINK: Locator = Locator::css("home link", &[".home-link", "[href='/']"]);

    /// Link to the profile page
    pub const PROFILE_LINK: Locator =
        Locator::css("profile link", &[".profile-link", "[href*='profile']"]);

    /// Every navigation locator
    pub const ALL: &[Locator] = &[MAIN_MENU, HOME_LINK, PROFILE_LINK];
}

const PAGES: &[(&str, &[Locator])] = &[
    ("login", login::ALL),
    ("common", common::ALL),
    ("dashboard", dashboard::ALL),
    ("navigation", navigation::ALL),
];

/// All registered locator groups as `(page, locators)`
#[must_use]
pub const fn pages() -> &'static [(&'static str, &'static [Locator])] {
    PAGES
}

/// Look up a locator by page and semantic name
#[must_use]
pub fn find(page: &str, name: &str) -> Option<Locator> {
    pages()
        .iter()
        .find(|(p, _)| *p == page)
        .and_then(|(_, locators)| locators.iter().find(|l| l.name() == name).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Strategy;
    use std::collections::HashSet;

    #[test]
    fn test_pages_listed() {
        let names: Vec<&str> = pages().iter().map(|(p, _)| *p).collect();
        assert_eq!(names, vec!["login", "common", "dashboard", "navigation"]);
    }

    #[test]
    fn test_names_unique_within_page() {
        for (page, locators) in pages() {
            let unique: HashSet<&str> = locators.iter().map(Locator::name).collect();
            assert_eq!(unique.len(), locators.len(), "duplicate name in {page}");
        }
    }

    #[test]
    fn test_every_locator_has_fragments() {
        for (_, locators) in pages() {
            for loc in *locators {
                assert!(!loc.fragments().is_empty(), "{loc} has no fragments");
                assert_eq!(loc.strategy(), Strategy::Css);
            }
        }
    }

    #[test]
    fn test_login_fragments_most_specific_first() {
        assert_eq!(login::EMAIL_INPUT.fragments()[0], "input[type='email']");
        assert_eq!(login::LOGIN_BUTTON.fragments().len(), 4);
        assert_eq!(
            login::PASSWORD_INPUT.to_css().unwrap(),
            "input[type='password'], input[name='password'], #password"
        );
    }

    #[test]
    fn test_find() {
        assert_eq!(find("login", "email input"), Some(login::EMAIL_INPUT));
        assert_eq!(find("common", "close button"), Some(common::CLOSE_BUTTON));
        assert!(find("login", "nope").is_none());
        assert!(find("nope", "email input").is_none());
    }
}
