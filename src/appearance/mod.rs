//! Desktop appearance (light/dark) query and control.
//!
//! This module provides a unified interface for reading and switching the desktop's
//! light/dark preference through the `AppearanceBackend` trait.
//!
//! ## Supported Backends
//!
//! - **Portal**: reads `org.freedesktop.appearance color-scheme` from
//!   xdg-desktop-portal over the session bus. Read-only.
//! - **GSettings**: reads and writes `org.gnome.desktop.interface color-scheme`
//!   through the `gsettings` tool.
//! - **Desktop** (default): GSettings for reads and writes, so a switch is
//!   always visible to the next read. The portal is consulted only when
//!   GSettings cannot be read.
//!
//! An unset or unreadable preference is reported as [`AppearanceMode::Light`].

use anyhow::Result;
use std::fmt;

pub mod gsettings;
pub mod portal;

pub use gsettings::GsettingsAppearance;
pub use portal::PortalAppearance;

/// Light/dark display mode of the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppearanceMode {
    Light,
    Dark,
}

impl AppearanceMode {
    /// Mode that matches the daylight status: daylight wants light, darkness wants dark.
    pub fn for_daylight(is_daylight: bool) -> Self {
        if is_daylight {
            AppearanceMode::Light
        } else {
            AppearanceMode::Dark
        }
    }

    pub fn is_dark(self) -> bool {
        self == AppearanceMode::Dark
    }

    /// Message logged right before switching to this mode.
    pub fn transition_message(self) -> &'static str {
        match self {
            AppearanceMode::Light => "☀ Let there be light",
            AppearanceMode::Dark => "☾ Darkness is coming",
        }
    }
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppearanceMode::Light => write!(f, "light"),
            AppearanceMode::Dark => write!(f, "dark"),
        }
    }
}

/// Trait for backends that can read and switch the desktop appearance.
#[cfg_attr(test, mockall::automock)]
pub trait AppearanceBackend {
    /// Current appearance of the desktop.
    ///
    /// Never fails: a preference that is unset or cannot be read counts as light.
    fn current_mode(&self) -> AppearanceMode;

    /// Switch the desktop to `mode`.
    ///
    /// # Returns
    /// - `Ok(())` once the desktop accepted the change
    /// - `Err` carrying the mechanism's diagnostic text otherwise
    fn set_mode(&mut self, mode: AppearanceMode) -> Result<()>;

    /// Human-readable name of this backend.
    fn backend_name(&self) -> &'static str;
}

/// Read-only source of the light/dark preference.
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceReader {
    fn read_preference(&self) -> Result<AppearanceMode>;
}

impl PreferenceReader for PortalAppearance {
    fn read_preference(&self) -> Result<AppearanceMode> {
        self.read_mode()
    }
}

/// Default backend: GSettings reads and writes, portal as a read fallback.
pub struct DesktopAppearance {
    gsettings: GsettingsAppearance,
    fallback: Option<Box<dyn PreferenceReader>>,
}

impl DesktopAppearance {
    /// Create the backend, connecting to the portal if the session bus is reachable.
    pub fn new() -> Self {
        let fallback = PortalAppearance::connect()
            .ok()
            .map(|portal| Box::new(portal) as Box<dyn PreferenceReader>);
        Self::with_parts(GsettingsAppearance::new(), fallback)
    }

    pub fn with_parts(
        gsettings: GsettingsAppearance,
        fallback: Option<Box<dyn PreferenceReader>>,
    ) -> Self {
        Self {
            gsettings,
            fallback,
        }
    }
}

impl Default for DesktopAppearance {
    fn default() -> Self {
        Self::new()
    }
}

impl AppearanceBackend for DesktopAppearance {
    fn current_mode(&self) -> AppearanceMode {
        let error = match self.gsettings.read_color_scheme() {
            Ok(value) => return gsettings::parse_color_scheme(&value),
            Err(e) => e,
        };

        if let Some(fallback) = &self.fallback
            && let Ok(mode) = fallback.read_preference()
        {
            return mode;
        }

        log_warning!("Could not read the current appearance: {error}");
        log_indented!("Assuming light mode");
        AppearanceMode::Light
    }

    fn set_mode(&mut self, mode: AppearanceMode) -> Result<()> {
        self.gsettings.set_mode(mode)
    }

    fn backend_name(&self) -> &'static str {
        if self.fallback.is_some() {
            "GSettings (portal fallback)"
        } else {
            "GSettings"
        }
    }
}

/// Create the appearance backend used by the daemon.
pub fn create_backend() -> Box<dyn AppearanceBackend> {
    Box::new(DesktopAppearance::new())
}
