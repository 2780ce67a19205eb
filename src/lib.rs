//! # Sunfollow Library
//!
//! Internal library for the sunfollow daemon.
//!
//! This library exists to enable testing of the daemon internals and to keep the
//! binary (main.rs) down to picking an exit status.
//!
//! ## Architecture
//!
//! - **Entry Point**: `SunFollow` builder provides the application API with resource management
//! - **Core Logic**: internal `core` module with the poll scheduler and the event loop
//! - **Appearance**: `appearance` module reading and switching the desktop light/dark mode
//! - **Geographic**: `geo` module for location detection and sunrise/sunset calculations
//! - **Infrastructure**: signal handling, the journal sink, logging, and constants

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod appearance;
mod core;
pub mod geo;
pub mod io;
mod sunfollow;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

pub use appearance::{AppearanceBackend, AppearanceMode};
pub use crate::core::LifecycleState;
pub use crate::core::scheduler::{PollTimer, TickOutcome, decide};
pub use geo::{SunDial, SunStatusSource};
pub use sunfollow::SunFollow;
