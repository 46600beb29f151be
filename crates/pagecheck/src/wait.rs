//! Bounded polling waits.
//!
//! Every wait in pagecheck goes through [`poll_until`]: it evaluates a probe,
//! sleeps, and retries until the probe yields a value or the timeout
//! elapses. There is no cancellation; the timeout is the only exit from a
//! pending wait.

use crate::result::{PageCheckError, PageCheckResult};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lower bound for the polling interval, keeps a zero interval from spinning
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Upper bound on the total time spent waiting
    pub timeout: Duration,
    /// Sleep between two probes
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Timeout in whole milliseconds, as reported in errors
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Poll `probe` until it returns `Ok(Some(_))` or `options.timeout` elapses.
///
/// The probe always runs at least once, even with a zero timeout.
/// `Ok(None)` and transient driver errors (stale element handles) mean
/// "not yet"; any other error aborts the wait immediately.
///
/// # Errors
///
/// Returns [`PageCheckError::Timeout`] naming `waited_for` when the deadline
/// passes, or the first non-transient error raised by the probe.
pub fn poll_until<T, F>(options: &WaitOptions, waited_for: &str, mut probe: F) -> PageCheckResult<T>
where
    F: FnMut() -> PageCheckResult<Option<T>>,
{
    let start = Instant::now();
    let poll_interval = options.poll_interval.max(MIN_POLL_INTERVAL);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match probe() {
            Ok(Some(value)) => {
                debug!(
                    waited_for,
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "wait satisfied"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(PageCheckError::Driver(err)) if err.is_transient() => {
                trace!(waited_for, error = %err, "transient driver error while polling");
            }
            Err(err) => return Err(err),
        }

        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            debug!(waited_for, attempts, "wait timed out");
            return Err(PageCheckError::Timeout {
                waited_for: waited_for.to_string(),
                ms: options.timeout_ms(),
            });
        }
        std::thread::sleep(poll_interval.min(options.timeout - elapsed));
    }
}

/// Poll a boolean predicate until it holds.
///
/// # Errors
///
/// Same as [`poll_until`].
pub fn wait_until<F>(options: &WaitOptions, waited_for: &str, mut predicate: F) -> PageCheckResult<()>
where
    F: FnMut() -> PageCheckResult<bool>,
{
    poll_until(options, waited_for, || Ok(predicate()?.then_some(())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DriverError;
    use std::cell::Cell;

    fn fast(timeout_ms: u64) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_poll_interval(Duration::from_millis(10))
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout, Duration::from_secs(10));
            assert_eq!(options.poll_interval, Duration::from_millis(500));
            assert_eq!(options.timeout_ms(), 10_000);
        }

        #[test]
        fn test_builder_chain() {
            let options = WaitOptions::new()
                .with_timeout(Duration::from_secs(2))
                .with_poll_interval(Duration::from_millis(100));
            assert_eq!(options.timeout_ms(), 2000);
            assert_eq!(options.poll_interval, Duration::from_millis(100));
        }
    }

    mod poll_tests {
        use super::*;

        #[test]
        fn test_immediate_success() {
            let value = poll_until(&fast(100), "value", || Ok(Some(42))).unwrap();
            assert_eq!(value, 42);
        }

        #[test]
        fn test_success_after_retries() {
            let calls = Cell::new(0);
            let value = poll_until(&fast(1000), "third call", || {
                calls.set(calls.get() + 1);
                Ok((calls.get() == 3).then_some("done"))
            })
            .unwrap();
            assert_eq!(value, "done");
            assert_eq!(calls.get(), 3);
        }

        #[test]
        fn test_timeout_is_bounded() {
            let start = Instant::now();
            let err = poll_until::<(), _>(&fast(150), "never", || Ok(None)).unwrap_err();
            let elapsed = start.elapsed();

            match err {
                PageCheckError::Timeout { waited_for, ms } => {
                    assert_eq!(waited_for, "never");
                    assert_eq!(ms, 150);
                }
                other => panic!("expected Timeout, got {other:?}"),
            }
            assert!(elapsed >= Duration::from_millis(150));
            assert!(elapsed < Duration::from_millis(600), "took {elapsed:?}");
        }

        #[test]
        fn test_zero_timeout_probes_once() {
            let calls = Cell::new(0);
            let result = poll_until::<(), _>(&fast(0), "once", || {
                calls.set(calls.get() + 1);
                Ok(None)
            });
            assert!(result.is_err());
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_stale_element_is_retried() {
            let calls = Cell::new(0);
            let value = poll_until(&fast(1000), "fresh handle", || {
                calls.set(calls.get() + 1);
                if calls.get() < 2 {
                    Err(DriverError::stale("detached").into())
                } else {
                    Ok(Some(true))
                }
            })
            .unwrap();
            assert!(value);
        }

        #[test]
        fn test_hard_error_aborts() {
            let calls = Cell::new(0);
            let err = poll_until::<(), _>(&fast(1000), "closed", || {
                calls.set(calls.get() + 1);
                Err(DriverError::SessionClosed.into())
            })
            .unwrap_err();
            assert!(matches!(err, PageCheckError::Driver(DriverError::SessionClosed)));
            assert_eq!(calls.get(), 1);
        }
    }

    mod wait_until_tests {
        use super::*;

        #[test]
        fn test_predicate_true() {
            assert!(wait_until(&fast(100), "true", || Ok(true)).is_ok());
        }

        #[test]
        fn test_predicate_false_times_out() {
            let err = wait_until(&fast(50), "false", || Ok(false)).unwrap_err();
            assert!(err.is_timeout());
        }
    }
}
