//! Application coordinator that manages the complete lifecycle of sunfollow.
//!
//! This module handles resource acquisition, initialization, and orchestration
//! of the core loop. It manages:
//! - The process-wide structured log sink
//! - Signal handler setup
//! - Sun status and appearance backend creation
//! - The startup banner
//!
//! The `SunFollow` struct uses a builder pattern so embedding code and tests can
//! swap the collaborators:
//! - Normal startup: `SunFollow::new().run()`
//! - Tests: `SunFollow::new().with_sun_status(..).with_appearance(..).without_structured_log().run()`

use anyhow::{Context, Result};
use std::time::Duration;

use crate::{
    appearance::{self, AppearanceBackend},
    common::constants::*,
    common::logger::Log,
    core::scheduler::PollScheduler,
    core::{Core, CoreParams},
    geo::{SolarSunStatus, SunStatusSource},
    io::journal::open_default_sink,
    io::signals::{SignalState, setup_signal_handler},
};

/// Builder for configuring and running the sunfollow daemon.
///
/// # Examples
///
/// ```no_run
/// use sunfollow::SunFollow;
///
/// # fn main() -> anyhow::Result<()> {
/// // Follow the sun with the host's location and desktop settings
/// SunFollow::new().run()?;
/// # Ok(())
/// # }
/// ```
pub struct SunFollow {
    sun_status: Option<Box<dyn SunStatusSource>>,
    appearance: Option<Box<dyn AppearanceBackend>>,
    signal_state: Option<SignalState>,
    poll_interval: Duration,
    structured_log: bool,
}

impl SunFollow {
    /// Create a new runner with defaults matching a normal run
    pub fn new() -> Self {
        Self {
            sun_status: None,
            appearance: None,
            signal_state: None,
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            structured_log: true,
        }
    }

    /// Use a custom sun status source instead of the system location
    pub fn with_sun_status(mut self, source: Box<dyn SunStatusSource>) -> Self {
        self.sun_status = Some(source);
        self
    }

    /// Use a custom appearance backend instead of the desktop settings
    pub fn with_appearance(mut self, backend: Box<dyn AppearanceBackend>) -> Self {
        self.appearance = Some(backend);
        self
    }

    /// Override the time between two daylight checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Receive signals from an existing channel instead of registering OS handlers
    pub fn with_signal_state(mut self, signal_state: SignalState) -> Self {
        self.signal_state = Some(signal_state);
        self
    }

    /// Skip the structured sink; output goes to the terminal only
    pub fn without_structured_log(mut self) -> Self {
        self.structured_log = false;
        self
    }

    /// Execute the daemon with the configured settings.
    ///
    /// Returns when a stop signal arrives (`Ok`) or on a fatal error (`Err`). The
    /// error is logged here, while the structured sink is still installed, so
    /// callers only have to pick the exit status.
    pub fn run(self) -> Result<()> {
        let _sink = if self.structured_log {
            Some(Log::install_sink(open_default_sink())?)
        } else {
            None
        };

        let result = self.follow();
        match &result {
            Ok(()) => log_end!(),
            Err(e) => log_error_exit!("{e:#}"),
        }
        result
    }

    fn follow(self) -> Result<()> {
        log_version!();
        let interval = self.poll_interval.as_secs_f64();
        log_block_start!("Following the sun... checking every {ANSI_BOLD}{interval}{ANSI_RESET} seconds");

        let signal_state = match self.signal_state {
            Some(state) => state,
            None => setup_signal_handler().context("failed to set up signal handling")?,
        };

        let sun_status = match self.sun_status {
            Some(source) => source,
            None => {
                let solar = SolarSunStatus::new();
                if let Ok(location) = solar.locate() {
                    log_decorated!(
                        "Location: {}, {} ({:.4}°, {:.4}°)",
                        location.city.name,
                        location.city.country,
                        location.latitude(),
                        location.longitude()
                    );
                }
                Box::new(solar)
            }
        };

        let appearance = self.appearance.unwrap_or_else(appearance::create_backend);
        log_decorated!("Appearance backend: {}", appearance.backend_name());

        let mut core = Core::new(CoreParams {
            scheduler: PollScheduler::new(sun_status, appearance),
            signal_state,
            poll_interval: self.poll_interval,
        });
        core.execute()
    }
}

impl Default for SunFollow {
    fn default() -> Self {
        Self::new()
    }
}
