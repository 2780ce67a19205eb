//! Location-based sun status.
//!
//! ## Module Structure
//!
//! - [`solar`]: the [`SunDial`] sample, the [`SunStatusSource`] trait and the
//!   `sunrise`-crate implementation
//! - [`timezone`]: host location detection from the system time zone

pub mod solar;
pub mod timezone;

pub use solar::{SolarSunStatus, SunDial, SunStatusSource};
pub use timezone::{CityInfo, Location, detect_location};
