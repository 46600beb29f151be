//! Driver session ownership.
//!
//! A [`DriverSession`] owns one driver for exactly one scenario and shuts
//! it down exactly once: through [`DriverSession::close`] or, on any other
//! exit path including a panic, in `Drop`.

use crate::driver::Driver;
use crate::result::DriverResult;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Driver is live
    Active,
    /// `quit` has been called
    Closed,
}

/// RAII guard around a live driver
#[derive(Debug)]
pub struct DriverSession<D: Driver> {
    driver: D,
    state: SessionState,
}

impl<D: Driver> DriverSession<D> {
    /// Take ownership of a live driver
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: SessionState::Active,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether `quit` has not run yet
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The driver while the session is active
    pub fn driver(&mut self) -> Option<&mut D> {
        match self.state {
            SessionState::Active => Some(&mut self.driver),
            SessionState::Closed => None,
        }
    }

    /// Quit the driver now; later calls are no-ops
    ///
    /// # Errors
    ///
    /// Returns the driver's error from `quit`
    pub fn close(&mut self) -> DriverResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        debug!("closing driver session");
        self.driver.quit()
    }

    /// Close the session and hand back the driver for inspection
    ///
    /// # Errors
    ///
    /// Returns the driver's error from `quit`; the driver is dropped
    pub fn finish(mut self) -> DriverResult<D>
    where
        D: Default,
    {
        self.close()?;
        Ok(std::mem::take(&mut self.driver))
    }
}

impl<D: Driver> Deref for DriverSession<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.driver
    }
}

impl<D: Driver> DerefMut for DriverSession<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: Driver> Drop for DriverSession<D> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "driver quit failed during teardown");
        }
    }
}
