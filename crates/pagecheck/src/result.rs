//! Result and error types for pagecheck.

use thiserror::Error;

/// Result type for pagecheck operations
pub type PageCheckResult<T> = Result<T, PageCheckError>;

/// Result type for raw driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by a [`Driver`](crate::Driver) implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Element handle no longer attached to the document
    #[error("Stale element handle: {message}")]
    StaleElement {
        /// Error message
        message: String,
    },

    /// The browser session was already shut down
    #[error("Driver session is closed")]
    SessionClosed,

    /// Browser executable not found or failed to start
    #[error("Failed to launch browser: {message}")]
    Launch {
        /// Error message
        message: String,
    },

    /// Any other failure reported by the automation protocol
    #[error("Driver protocol error: {message}")]
    Protocol {
        /// Error message
        message: String,
    },
}

impl DriverError {
    /// Create a stale element error
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::StaleElement {
            message: message.into(),
        }
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Whether a poll loop may retry after this error
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }
}

/// Errors that can occur in pagecheck
#[derive(Debug, Error)]
pub enum PageCheckError {
    /// Locator never matched within the timeout
    #[error("Element '{locator}' not found after {ms}ms")]
    NotFoundTimeout {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Element present but never became interactable
    #[error("Element '{locator}' not clickable after {ms}ms")]
    NotClickableTimeout {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// URL / redirect condition never satisfied
    #[error("Navigation timed out after {ms}ms: expected {expected}, current URL is {actual}")]
    NavigationTimeout {
        /// Expected URL condition
        expected: String,
        /// URL observed when the wait gave up
        actual: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Generic bounded wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Description of the awaited condition
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Driver collaborator failure
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PageCheckError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is one of the wait timeouts
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NotFoundTimeout { .. }
                | Self::NotClickableTimeout { .. }
                | Self::NavigationTimeout { .. }
                | Self::Timeout { .. }
        )
    }
}

/// Fail with [`PageCheckError::AssertionFailed`] unless `condition` holds.
///
/// # Errors
///
/// Returns the assertion error carrying `message`.
pub fn ensure(condition: bool, message: impl Into<String>) -> PageCheckResult<()> {
    if condition {
        Ok(())
    } else {
        Err(PageCheckError::assertion(message))
    }
}
