//! Suite configuration.
//!
//! Loaded from YAML, then overridden from the environment:
//!
//! | Variable                  | Field                     |
//! |---------------------------|---------------------------|
//! | `PAGECHECK_LOGIN_URL`     | `login_url`               |
//! | `PAGECHECK_PROJECTS_URL`  | `projects_url`            |
//! | `PAGECHECK_PROJECTS_PATH` | `projects_path`           |
//! | `PAGECHECK_TIMEOUT_SECS`  | `default_timeout_secs`    |
//! | `PAGECHECK_HEADLESS`      | `browser.headless`        |
//! | `CHROMIUM_PATH`           | `browser.chromium_path`   |
//! | `PAGECHECK_RESULTS_DIR`   | `results_dir`             |

use crate::result::{PageCheckError, PageCheckResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Login form served at the site root
pub const DEFAULT_LOGIN_URL: &str = "https://construction-supervision.alex-fisher-dev.ru/";

/// Landing page after a successful login
pub const DEFAULT_PROJECTS_URL: &str =
    "https://construction-supervision.alex-fisher-dev.ru/lk/projects";

/// Path fragment identifying the post-login page
pub const DEFAULT_PROJECTS_PATH: &str = "/lk/projects";

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Keep the Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// Pass `--disable-gpu`
    pub disable_gpu: bool,
    /// Pass `--disable-dev-shm-usage`
    pub disable_dev_shm: bool,
    /// Chromium executable (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            window_width: 1920,
            window_height: 1080,
            disable_gpu: true,
            disable_dev_shm: true,
            chromium_path: None,
        }
    }
}

impl BrowserSettings {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the Chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Command-line flags passed to Chromium
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
        }
        if self.disable_dev_shm {
            args.push("--disable-dev-shm-usage".to_string());
        }
        if self.headless {
            args.push("--headless".to_string());
        }
        args.push(format!(
            "--window-size={},{}",
            self.window_width, self.window_height
        ));
        if self.disable_gpu {
            args.push("--disable-gpu".to_string());
        }
        args
    }
}

/// Configuration shared by every scenario of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Login form URL
    pub login_url: String,
    /// Full URL of the post-login page
    pub projects_url: String,
    /// Path fragment present in every post-login URL
    pub projects_path: String,
    /// Default timeout for element and URL waits, in seconds
    pub default_timeout_secs: u64,
    /// Sleep between two polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Where result and attachment files are written
    pub results_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            projects_url: DEFAULT_PROJECTS_URL.to_string(),
            projects_path: DEFAULT_PROJECTS_PATH.to_string(),
            default_timeout_secs: 10,
            poll_interval_ms: 500,
            browser: BrowserSettings::default(),
            results_dir: PathBuf::from("pagecheck-results"),
        }
    }
}

impl SuiteConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid YAML or fails validation
    pub fn from_yaml(yaml: &str) -> PageCheckResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> PageCheckResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading suite config");
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if an override has an invalid value
    pub fn from_env() -> PageCheckResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if an override has an invalid value
    pub fn apply_env(&mut self) -> PageCheckResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    ///
    /// # Errors
    ///
    /// Returns error if an override has an invalid value
    pub fn apply_overrides<F>(&mut self, lookup: F) -> PageCheckResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PAGECHECK_LOGIN_URL") {
            self.login_url = url;
        }
        if let Some(url) = lookup("PAGECHECK_PROJECTS_URL") {
            self.projects_url = url;
        }
        if let Some(path) = lookup("PAGECHECK_PROJECTS_PATH") {
            self.projects_path = path;
        }
        if let Some(secs) = lookup("PAGECHECK_TIMEOUT_SECS") {
            self.default_timeout_secs = secs.trim().parse().map_err(|_| {
                PageCheckError::config(format!("PAGECHECK_TIMEOUT_SECS is not a number: {secs}"))
            })?;
        }
        if let Some(flag) = lookup("PAGECHECK_HEADLESS") {
            self.browser.headless = parse_flag(&flag).ok_or_else(|| {
                PageCheckError::config(format!("PAGECHECK_HEADLESS is not a boolean: {flag}"))
            })?;
        }
        if let Some(path) = lookup("CHROMIUM_PATH") {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("PAGECHECK_RESULTS_DIR") {
            self.results_dir = PathBuf::from(dir);
        }
        self.validate()
    }

    /// Check invariants the page objects rely on
    ///
    /// # Errors
    ///
    /// Returns [`PageCheckError::Config`] naming the offending field
    pub fn validate(&self) -> PageCheckResult<()> {
        if self.login_url.trim().is_empty() {
            return Err(PageCheckError::config("login_url must not be empty"));
        }
        if self.projects_url.trim().is_empty() {
            return Err(PageCheckError::config("projects_url must not be empty"));
        }
        if self.projects_path.trim().is_empty() {
            return Err(PageCheckError::config("projects_path must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(PageCheckError::config("poll_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Default wait timeout
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Poll interval for waits
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait options derived from this config
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout: self.default_timeout(),
            poll_interval: self.poll_interval(),
        }
    }

    /// Serialize back to YAML
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> PageCheckResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
