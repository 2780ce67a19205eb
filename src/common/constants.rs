//! Application-wide constants.
//!
//! sunfollow has no runtime configuration surface. Every tunable lives here and
//! is fixed at compile time.

// # Scheduling

/// Seconds between two daylight checks.
pub const POLL_INTERVAL_SECS: u64 = 60;

// # Identity

/// Name reported in the version header and as the journal identifier.
pub const APP_NAME: &str = "sunfollow";

/// Journal category used when running under init/systemd (parent PID 1).
pub const LOG_CATEGORY_DAEMON: &str = "daemon";

/// Journal category used when started from a shell or session.
pub const LOG_CATEGORY_DEFAULT: &str = "default";

// # Appearance

/// xdg-desktop-portal namespace holding the appearance settings.
pub const PORTAL_APPEARANCE_NAMESPACE: &str = "org.freedesktop.appearance";

/// xdg-desktop-portal key for the light/dark preference.
pub const PORTAL_COLOR_SCHEME_KEY: &str = "color-scheme";

/// GSettings schema written to switch the desktop appearance.
pub const GSETTINGS_SCHEMA: &str = "org.gnome.desktop.interface";

/// GSettings key inside [`GSETTINGS_SCHEMA`].
pub const GSETTINGS_COLOR_SCHEME_KEY: &str = "color-scheme";

// # Location

/// Files consulted, in order, to find the system time zone.
pub const LOCALTIME_PATH: &str = "/etc/localtime";
pub const TIMEZONE_FILE_PATH: &str = "/etc/timezone";

/// Prefix of the compiled zoneinfo database that `/etc/localtime` links into.
pub const ZONEINFO_MARKER: &str = "zoneinfo/";

// # ANSI decoration used in log messages

pub const ANSI_BOLD: &str = "\x1b[1m";
pub const ANSI_BLUE: &str = "\x1b[38;5;039m";
pub const ANSI_YELLOW: &str = "\x1b[38;5;228m";
pub const ANSI_RESET: &str = "\x1b[0m";
