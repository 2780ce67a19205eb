//! Sun status for the host location.
//!
//! Produces a [`SunDial`]: today's sunrise and sunset as Unix timestamps plus a
//! daylight flag. The computation itself is delegated to the `sunrise` crate.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::timezone::{Location, detect_location};

/// Sun schedule sample. Produced fresh by every query, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunDial {
    /// Sunrise, seconds since the Unix epoch.
    pub sunrise: f64,
    /// Sunset, seconds since the Unix epoch.
    pub sunset: f64,
    /// Whether the sampling instant lies between sunrise and sunset.
    pub is_daylight: bool,
}

impl SunDial {
    /// Daylight status symbol used in the logs.
    pub fn symbol(&self) -> &'static str {
        if self.is_daylight { "☀" } else { "☾" }
    }

    pub fn sunrise_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.sunrise)
    }

    pub fn sunset_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.sunset)
    }
}

fn epoch_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

/// Source of sun status samples.
///
/// An `Err` means the schedule is unavailable, typically because the host
/// location cannot be determined.
#[cfg_attr(test, mockall::automock)]
pub trait SunStatusSource {
    fn query(&self) -> Result<SunDial>;
}

/// Where [`SolarSunStatus`] takes its location from.
#[derive(Debug, Clone, Copy)]
pub enum LocationSource {
    /// Detect from the system time zone on every query.
    System,
    /// Always use this location.
    Fixed(Location),
}

/// Sun status computed from the host location with the `sunrise` crate.
pub struct SolarSunStatus {
    source: LocationSource,
    clock: fn() -> DateTime<Utc>,
}

impl SolarSunStatus {
    /// Sun status for the system location at the current time.
    pub fn new() -> Self {
        Self {
            source: LocationSource::System,
            clock: Utc::now,
        }
    }

    /// Sun status for a fixed location.
    pub fn at_location(location: Location) -> Self {
        Self {
            source: LocationSource::Fixed(location),
            clock: Utc::now,
        }
    }

    /// Replace the clock used to sample the current time.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve the location queries are computed for.
    pub fn locate(&self) -> Result<Location> {
        match self.source {
            LocationSource::System => detect_location(),
            LocationSource::Fixed(location) => Ok(location),
        }
    }
}

impl Default for SolarSunStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SunStatusSource for SolarSunStatus {
    fn query(&self) -> Result<SunDial> {
        let location = self.locate()?;
        sun_dial_at(&location, (self.clock)())
    }
}

/// Compute the sun dial for `location` at instant `now`.
///
/// Uses the calendar date at the location. Fails when that day has no
/// sunrise/sunset pair (polar day or night).
pub fn sun_dial_at(location: &Location, now: DateTime<Utc>) -> Result<SunDial> {
    let date = now.with_timezone(&location.timezone).date_naive();
    let (sunrise, sunset) = solar_events(location.latitude(), location.longitude(), date)
        .with_context(|| format!("No sun schedule for {} on {date}", location.city.name))?;

    Ok(SunDial {
        sunrise: sunrise.timestamp_millis() as f64 / 1000.0,
        sunset: sunset.timestamp_millis() as f64 / 1000.0,
        is_daylight: sunrise <= now && now < sunset,
    })
}

/// Sunrise and sunset in UTC for the given coordinates and date.
pub fn solar_events(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let coord = Coordinates::new(latitude, longitude)
        .ok_or_else(|| anyhow::anyhow!("Invalid coordinates: {latitude}, {longitude}"))?;
    let solar_day = SolarDay::new(coord, date);
    let sunrise = solar_day.event_time(SolarEvent::Sunrise);
    let sunset = solar_day.event_time(SolarEvent::Sunset);

    // Without a real sunrise/sunset the crate yields degenerate times; both events
    // must fall within a day of the date's noon, in order.
    let noon = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::hours(12);
    let plausible = |t: DateTime<Utc>| (t - noon).abs() < Duration::hours(24);
    if !(plausible(sunrise) && plausible(sunset)) || sunset <= sunrise {
        anyhow::bail!("The sun does not rise and set on {date} at {latitude:.2}, {longitude:.2}");
    }

    Ok((sunrise, sunset))
}
