//! Poll scheduling and the light/dark decision.
//!
//! Every tick samples the sun status and the desktop appearance and switches the
//! appearance only when the two disagree. Nothing is remembered between ticks, so
//! a manual change made outside sunfollow is reconciled on the next tick.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use crate::appearance::{AppearanceBackend, AppearanceMode};
use crate::common::constants::*;
use crate::geo::{SunDial, SunStatusSource};

/// Mode to switch to, or `None` when the desktop already matches the daylight.
pub fn decide(is_daylight: bool, current: AppearanceMode) -> Option<AppearanceMode> {
    let desired = AppearanceMode::for_daylight(is_daylight);
    (desired != current).then_some(desired)
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The desktop already matched; nothing was changed.
    Unchanged(AppearanceMode),
    /// The appearance was switched.
    Switched {
        from: AppearanceMode,
        to: AppearanceMode,
    },
}

/// Repeating poll timer.
///
/// At most one timer is active: arming an armed timer is an error. Fires are
/// fixed-rate; periods missed while a tick ran long are skipped, not replayed.
#[derive(Debug)]
pub struct PollTimer {
    interval: Duration,
    next_fire: Option<Instant>,
}

impl PollTimer {
    /// Create an unarmed timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_fire: None,
        }
    }

    /// Arm the timer with its first fire at `now`.
    pub fn arm(&mut self, now: Instant) -> Result<()> {
        if self.next_fire.is_some() {
            anyhow::bail!("Poll timer is already armed");
        }
        self.next_fire = Some(now);
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Time left until the next fire, `None` when the timer is not armed.
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.next_fire.map(|next| next.saturating_duration_since(now))
    }

    /// Consume a due fire and schedule the next one.
    ///
    /// Returns `false` when the timer is not armed or not yet due.
    pub fn fire(&mut self, now: Instant) -> bool {
        let Some(next) = self.next_fire else {
            return false;
        };
        if now < next {
            return false;
        }

        let mut upcoming = next + self.interval;
        while upcoming <= now {
            upcoming += self.interval;
        }
        self.next_fire = Some(upcoming);
        true
    }

    /// Disarm the timer. Returns whether it was armed.
    pub fn invalidate(&mut self) -> bool {
        self.next_fire.take().is_some()
    }
}

/// Runs the sampling-and-decision routine against the collaborators.
pub struct PollScheduler {
    sun_status: Box<dyn SunStatusSource>,
    appearance: Box<dyn AppearanceBackend>,
    ticks: u64,
}

impl PollScheduler {
    pub fn new(
        sun_status: Box<dyn SunStatusSource>,
        appearance: Box<dyn AppearanceBackend>,
    ) -> Self {
        Self {
            sun_status,
            appearance,
            ticks: 0,
        }
    }

    /// Number of ticks run so far.
    #[cfg(test)]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Query the sun status, logging the likely cause when it is unavailable.
    pub fn check_sun_status(&self) -> Result<SunDial> {
        match self.sun_status.query() {
            Ok(dial) => Ok(dial),
            Err(e) => {
                log_pipe!();
                log_error!("Sunset/Sunrise schedule not available.");
                log_error_indented!(
                    "📍 This might be because the system can't determine your location,"
                );
                log_error_indented!(
                    "this can be the case for example when no time zone is configured for this machine."
                );
                Err(e.context("Sun status unavailable"))
            }
        }
    }

    /// Run one tick.
    ///
    /// Switches the appearance when it disagrees with the daylight status. A sun
    /// status or setter failure is returned as an error and is fatal to the daemon.
    pub fn on_tick(&mut self) -> Result<TickOutcome> {
        self.ticks += 1;

        let dial = self.check_sun_status()?;
        let color = if dial.is_daylight {
            ANSI_YELLOW
        } else {
            ANSI_BLUE
        };
        log_decorated!("Daylight status → {color}{}{ANSI_RESET}", dial.symbol());

        let current = self.appearance.current_mode();
        let Some(desired) = decide(dial.is_daylight, current) else {
            return Ok(TickOutcome::Unchanged(current));
        };

        log_block_start!("{}", desired.transition_message());
        self.appearance.set_mode(desired).with_context(|| {
            format!(
                "{} backend could not switch the appearance",
                self.appearance.backend_name()
            )
        })?;

        Ok(TickOutcome::Switched {
            from: current,
            to: desired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::MockAppearanceBackend;
    use crate::geo::solar::MockSunStatusSource;
    use crate::testing::{FakeAppearance, FakeSunStatus};
    use mockall::predicate::eq;
    use proptest::prelude::*;

    fn dial(is_daylight: bool) -> SunDial {
        SunDial {
            sunrise: 1_718_941_380.0,
            sunset: 1_719_001_260.0,
            is_daylight,
        }
    }

    fn sun_source(is_daylight: bool) -> MockSunStatusSource {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query().returning(move || Ok(dial(is_daylight)));
        sun
    }

    #[test]
    fn test_decide_table() {
        use AppearanceMode::*;
        assert_eq!(decide(true, Light), None);
        assert_eq!(decide(true, Dark), Some(Light));
        assert_eq!(decide(false, Light), Some(Dark));
        assert_eq!(decide(false, Dark), None);
    }

    proptest! {
        /// A change is requested exactly when the mode differs from the daylight's mode.
        #[test]
        fn test_decide_requests_change_iff_mismatch(is_daylight in any::<bool>(), dark in any::<bool>()) {
            let current = if dark { AppearanceMode::Dark } else { AppearanceMode::Light };
            let expected = if is_daylight { AppearanceMode::Light } else { AppearanceMode::Dark };

            match decide(is_daylight, current) {
                Some(target) => {
                    prop_assert_ne!(current, expected);
                    prop_assert_eq!(target, expected);
                }
                None => {
                    prop_assert_eq!(current, expected);
                }
            }
        }
    }

    #[test]
    fn test_daylight_with_dark_mode_switches_to_light() {
        let mut appearance = MockAppearanceBackend::new();
        appearance
            .expect_current_mode()
            .return_const(AppearanceMode::Dark);
        appearance
            .expect_set_mode()
            .with(eq(AppearanceMode::Light))
            .times(1)
            .returning(|_| Ok(()));

        let mut scheduler = PollScheduler::new(Box::new(sun_source(true)), Box::new(appearance));
        let outcome = scheduler.on_tick().unwrap();

        assert_eq!(
            outcome,
            TickOutcome::Switched {
                from: AppearanceMode::Dark,
                to: AppearanceMode::Light
            }
        );
        assert_eq!(scheduler.ticks(), 1);
    }

    #[test]
    fn test_night_with_dark_mode_does_nothing() {
        let mut appearance = MockAppearanceBackend::new();
        appearance
            .expect_current_mode()
            .return_const(AppearanceMode::Dark);
        appearance.expect_set_mode().never();

        let mut scheduler = PollScheduler::new(Box::new(sun_source(false)), Box::new(appearance));

        assert_eq!(
            scheduler.on_tick().unwrap(),
            TickOutcome::Unchanged(AppearanceMode::Dark)
        );
    }

    #[test]
    fn test_manual_change_is_reconciled_on_next_tick() {
        let sun = FakeSunStatus::daylight();
        let desktop = FakeAppearance::new(AppearanceMode::Dark);
        let mut scheduler = PollScheduler::new(Box::new(sun), Box::new(desktop.clone()));

        scheduler.on_tick().unwrap();
        assert_eq!(
            scheduler.on_tick().unwrap(),
            TickOutcome::Unchanged(AppearanceMode::Light)
        );

        // The user flips back to dark between ticks
        desktop.change_externally(AppearanceMode::Dark);
        assert_eq!(
            scheduler.on_tick().unwrap(),
            TickOutcome::Switched {
                from: AppearanceMode::Dark,
                to: AppearanceMode::Light
            }
        );
        assert_eq!(
            desktop.set_calls(),
            vec![AppearanceMode::Light, AppearanceMode::Light]
        );
    }

    #[test]
    fn test_setter_failure_is_fatal_with_diagnostic() {
        let mut appearance = MockAppearanceBackend::new();
        appearance
            .expect_current_mode()
            .return_const(AppearanceMode::Light);
        appearance
            .expect_set_mode()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("No such schema “org.gnome.desktop.interface”")));
        appearance.expect_backend_name().return_const("GSettings");

        let mut scheduler = PollScheduler::new(Box::new(sun_source(false)), Box::new(appearance));
        let err = scheduler.on_tick().unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("GSettings backend could not switch the appearance"));
        assert!(chain.contains("No such schema"));
    }

    #[test]
    fn test_unavailable_sun_status_skips_appearance() {
        let mut sun = MockSunStatusSource::new();
        sun.expect_query()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("No known location for time zone UTC")));
        let mut appearance = MockAppearanceBackend::new();
        appearance.expect_current_mode().never();
        appearance.expect_set_mode().never();

        let mut scheduler = PollScheduler::new(Box::new(sun), Box::new(appearance));
        let err = scheduler.on_tick().unwrap_err();
        assert!(format!("{err:#}").contains("Sun status unavailable"));
    }

    #[test]
    fn test_timer_arm_once() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(60));
        assert!(!timer.is_valid());
        assert_eq!(timer.time_until_fire(now), None);

        timer.arm(now).unwrap();
        assert!(timer.is_valid());
        assert!(timer.arm(now).is_err());
        assert_eq!(timer.time_until_fire(now), Some(Duration::ZERO));
    }

    #[test]
    fn test_timer_fixed_rate() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(60));
        timer.arm(start).unwrap();

        assert!(timer.fire(start));
        assert!(!timer.fire(start + Duration::from_secs(30)));
        assert_eq!(
            timer.time_until_fire(start + Duration::from_secs(30)),
            Some(Duration::from_secs(30))
        );

        // A fire late by a few seconds keeps the 60 s grid
        assert!(timer.fire(start + Duration::from_secs(62)));
        assert_eq!(
            timer.time_until_fire(start + Duration::from_secs(62)),
            Some(Duration::from_secs(58))
        );
    }

    #[test]
    fn test_timer_skips_missed_periods() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(60));
        timer.arm(start).unwrap();
        assert!(timer.fire(start));

        // Stalled for three and a half periods: one fire, then back on the grid
        let late = start + Duration::from_secs(210);
        assert!(timer.fire(late));
        assert!(!timer.fire(late));
        assert_eq!(timer.time_until_fire(late), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_timer_invalidate() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(60));
        assert!(!timer.invalidate());

        timer.arm(now).unwrap();
        assert!(timer.invalidate());
        assert!(!timer.is_valid());
        assert!(!timer.fire(now));
        assert!(!timer.invalidate());
    }
}
