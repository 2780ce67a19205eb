//! Core application logic and lifecycle.
//!
//! This module runs sunfollow's single-threaded event loop. The only events are
//! poll timer fires, dispatched to the [`PollScheduler`], and forwarded signals,
//! dispatched to the signal handler. A tick always completes before the next event
//! is looked at, so ticks never overlap and a stop request never interrupts one.
//!
//! Lifecycle: `Starting → Running → Stopping → Terminated`.

pub mod scheduler;

use anyhow::Result;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use crate::{
    core::scheduler::{PollScheduler, PollTimer, TickOutcome},
    io::signals::{SignalAction, SignalMessage, SignalState, handle_signal},
};

/// Daemon lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Stopping,
    Terminated,
}

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub scheduler: PollScheduler,
    pub signal_state: SignalState,
    pub poll_interval: Duration,
}

/// Core state machine owning the scheduler, the poll timer and the signal channel.
pub(crate) struct Core {
    scheduler: PollScheduler,
    signal_state: SignalState,
    timer: PollTimer,
    state: LifecycleState,
    signals_lost: bool,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            scheduler: params.scheduler,
            signal_state: params.signal_state,
            timer: PollTimer::new(params.poll_interval),
            state: LifecycleState::Starting,
            signals_lost: false,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[cfg(test)]
    pub fn timer(&self) -> &PollTimer {
        &self.timer
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Run the daemon until a stop signal or a fatal error.
    ///
    /// Startup checks the sun status once; if it is unavailable the timer is never
    /// armed and the error is returned. Otherwise the timer is armed with an
    /// immediate first fire and the event loop runs.
    pub fn execute(&mut self) -> Result<()> {
        let startup = self.startup();
        let result = startup.and_then(|()| self.main_loop());
        self.teardown();
        result
    }

    fn startup(&mut self) -> Result<()> {
        let dial = self.scheduler.check_sun_status()?;
        if let (Some(sunrise), Some(sunset)) = (dial.sunrise_utc(), dial.sunset_utc()) {
            let sunrise = sunrise.with_timezone(&chrono::Local);
            let sunset = sunset.with_timezone(&chrono::Local);
            log_indented!("Sunrise: {}", sunrise.format("%H:%M:%S"));
            log_indented!("Sunset:  {}", sunset.format("%H:%M:%S"));
        }

        self.timer.arm(Instant::now())?;
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Event loop: wait for the next timer fire or a signal, whichever comes first.
    fn main_loop(&mut self) -> Result<()> {
        while self.state == LifecycleState::Running {
            let wait = self
                .timer
                .time_until_fire(Instant::now())
                .unwrap_or(Duration::MAX);

            if self.signals_lost {
                std::thread::sleep(wait);
                self.tick_if_due()?;
                continue;
            }

            match self.signal_state.signal_receiver.recv_timeout(wait) {
                Ok(SignalMessage::Received(signo)) => {
                    if handle_signal(signo) == SignalAction::Stop {
                        self.state = LifecycleState::Stopping;
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.tick_if_due()?,
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_warning!("Signal handler disconnected unexpectedly");
                    log_indented!("Signals will no longer be processed");
                    self.signals_lost = true;
                }
            }
        }

        Ok(())
    }

    fn tick_if_due(&mut self) -> Result<()> {
        if !self.timer.fire(Instant::now()) {
            return Ok(());
        }

        if let TickOutcome::Switched { from, to } = self.scheduler.on_tick()? {
            log_indented!("Switched the desktop from {from} to {to} mode");
        }
        Ok(())
    }

    /// Release the timer and the signal registration.
    fn teardown(&mut self) {
        self.timer.invalidate();
        self.signal_state.close();
        self.state = LifecycleState::Terminated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::{AppearanceMode, MockAppearanceBackend};
    use crate::geo::SunDial;
    use crate::geo::solar::MockSunStatusSource;
    use mockall::predicate::eq;
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use std::sync::mpsc::Sender;
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn dial(is_daylight: bool) -> SunDial {
        SunDial {
            sunrise: 1_718_941_380.0,
            sunset: 1_719_001_260.0,
            is_daylight,
        }
    }

    fn core_with(
        sun: MockSunStatusSource,
        appearance: MockAppearanceBackend,
        poll_interval: Duration,
    ) -> (Core, Sender<SignalMessage>) {
        let (signal_state, sender) = SignalState::detached();
        let core = Core::new(CoreParams {
            scheduler: PollScheduler::new(Box::new(sun), Box::new(appearance)),
            signal_state,
            poll_interval,
        });
        (core, sender)
    }

    #[test]
    fn test_unavailable_sun_status_never_arms_timer() {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("no location")));
        let mut appearance = MockAppearanceBackend::new();
        appearance.expect_current_mode().never();
        appearance.expect_set_mode().never();

        let (mut core, _sender) = core_with(sun, appearance, Duration::from_secs(60));
        let err = core.execute().unwrap_err();

        assert!(format!("{err:#}").contains("Sun status unavailable"));
        assert_eq!(core.scheduler().ticks(), 0);
        assert!(!core.timer().is_valid());
        assert_eq!(core.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_stop_signal_before_first_tick() {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query().times(1).returning(|| Ok(dial(true)));
        let mut appearance = MockAppearanceBackend::new();
        appearance.expect_set_mode().never();

        let (mut core, sender) = core_with(sun, appearance, Duration::from_secs(60));
        sender.send(SignalMessage::Received(SIGINT)).unwrap();

        core.execute().unwrap();
        assert_eq!(core.state(), LifecycleState::Terminated);
        assert!(!core.timer().is_valid());
        assert_eq!(core.scheduler().ticks(), 0);
    }

    #[test]
    fn test_switch_happens_once_while_inputs_are_unchanged() {
        let mut sun = MockSunStatusSource::new();
        // Startup check, then every tick
        sun.expect_query().returning(|| Ok(dial(true)));

        let desktop = Arc::new(Mutex::new(AppearanceMode::Dark));
        let mut appearance = MockAppearanceBackend::new();
        let read = Arc::clone(&desktop);
        appearance
            .expect_current_mode()
            .returning(move || *read.lock().unwrap());
        let write = Arc::clone(&desktop);
        appearance
            .expect_set_mode()
            .with(eq(AppearanceMode::Light))
            .times(1)
            .returning(move |mode| {
                *write.lock().unwrap() = mode;
                Ok(())
            });

        let (mut core, sender) = core_with(sun, appearance, Duration::from_millis(10));
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(120));
            sender.send(SignalMessage::Received(SIGTERM)).unwrap();
        });

        core.execute().unwrap();
        stopper.join().unwrap();

        assert!(core.scheduler().ticks() >= 2, "ticks: {}", core.scheduler().ticks());
        assert_eq!(*desktop.lock().unwrap(), AppearanceMode::Light);
        assert_eq!(core.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_unhandled_signal_keeps_running() {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query().returning(|| Ok(dial(false)));
        let mut appearance = MockAppearanceBackend::new();
        appearance
            .expect_current_mode()
            .return_const(AppearanceMode::Dark);
        appearance.expect_set_mode().never();

        let (mut core, sender) = core_with(sun, appearance, Duration::from_millis(10));
        sender.send(SignalMessage::Received(SIGHUP)).unwrap();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(80));
            sender.send(SignalMessage::Received(SIGINT)).unwrap();
        });

        core.execute().unwrap();
        stopper.join().unwrap();

        // Still ticked after the SIGHUP
        assert!(core.scheduler().ticks() >= 1);
        assert_eq!(core.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_setter_failure_stops_loop_with_error() {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query().returning(|| Ok(dial(false)));
        let mut appearance = MockAppearanceBackend::new();
        appearance
            .expect_current_mode()
            .return_const(AppearanceMode::Light);
        appearance
            .expect_set_mode()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("dconf is read-only")));
        appearance.expect_backend_name().return_const("GSettings");

        let (mut core, _sender) = core_with(sun, appearance, Duration::from_secs(60));
        let err = core.execute().unwrap_err();

        assert!(format!("{err:#}").contains("dconf is read-only"));
        assert_eq!(core.scheduler().ticks(), 1);
        assert!(!core.timer().is_valid());
        assert_eq!(core.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_lost_signal_channel_still_ticks() {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query().returning(|| Ok(dial(false)));
        let mut appearance = MockAppearanceBackend::new();
        appearance
            .expect_current_mode()
            .return_const(AppearanceMode::Light);
        // The first tick fails so the loop has a way out
        appearance
            .expect_set_mode()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("stop here")));
        appearance.expect_backend_name().return_const("GSettings");

        let (mut core, sender) = core_with(sun, appearance, Duration::from_millis(10));
        drop(sender);

        assert!(core.execute().is_err());
        assert_eq!(core.scheduler().ticks(), 1);
    }
}
