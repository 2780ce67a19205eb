//! xdg-desktop-portal appearance reader.
//!
//! The portal's Settings interface exposes the desktop-neutral
//! `org.freedesktop.appearance color-scheme` key: 0 = no preference,
//! 1 = prefer dark, 2 = prefer light. The portal offers no way to write it.

use anyhow::{Context, Result};
use zbus::blocking::Connection;
use zbus::zvariant::OwnedValue;

use super::AppearanceMode;
use crate::common::constants::*;

/// D-Bus proxy trait for the portal Settings interface.
#[zbus::proxy(
    interface = "org.freedesktop.portal.Settings",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop"
)]
trait PortalSettings {
    /// Read a single setting value.
    fn read_one(&self, namespace: &str, key: &str) -> zbus::Result<OwnedValue>;
}

/// Reader for the portal's color-scheme preference.
pub struct PortalAppearance {
    connection: Connection,
}

impl PortalAppearance {
    /// Connect to the session bus.
    pub fn connect() -> Result<Self> {
        let connection = Connection::session().context("Failed to connect to session D-Bus")?;
        Ok(Self { connection })
    }

    /// Read the raw color-scheme value.
    pub fn read_color_scheme(&self) -> Result<u32> {
        let proxy = PortalSettingsProxyBlocking::new(&self.connection)
            .context("Failed to create portal settings proxy")?;
        let value = proxy
            .read_one(PORTAL_APPEARANCE_NAMESPACE, PORTAL_COLOR_SCHEME_KEY)
            .context("Failed to read color-scheme from the desktop portal")?;

        u32::try_from(value).context("Portal returned a non-integer color-scheme")
    }

    /// Read the current mode.
    pub fn read_mode(&self) -> Result<AppearanceMode> {
        self.read_color_scheme().map(mode_from_portal_value)
    }
}

/// Map a portal color-scheme value to a mode. Only 1 ("prefer dark") is dark.
pub fn mode_from_portal_value(value: u32) -> AppearanceMode {
    match value {
        1 => AppearanceMode::Dark,
        _ => AppearanceMode::Light,
    }
}
