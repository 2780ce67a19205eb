//! GSettings appearance backend.
//!
//! Reads and writes `org.gnome.desktop.interface color-scheme` by running the
//! `gsettings` tool. This is the write path on GNOME and on any desktop whose
//! portal implementation follows the GNOME setting (most GTK-based ones do).

use anyhow::{Context, Result};
use std::process::Command;

use super::{AppearanceBackend, AppearanceMode};
use crate::common::constants::*;

/// Appearance backend driving the `gsettings` command-line tool.
pub struct GsettingsAppearance {
    program: String,
}

impl GsettingsAppearance {
    pub fn new() -> Self {
        Self::with_program("gsettings")
    }

    /// Use a specific `gsettings` executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Read the raw `color-scheme` value, without GVariant quoting.
    pub fn read_color_scheme(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .args(["get", GSETTINGS_SCHEMA, GSETTINGS_COLOR_SCHEME_KEY])
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} get failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .trim()
            .trim_matches('\'')
            .to_string())
    }

    fn write_color_scheme(&self, value: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["set", GSETTINGS_SCHEMA, GSETTINGS_COLOR_SCHEME_KEY, value])
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = stderr.trim();
            if diagnostic.is_empty() {
                anyhow::bail!("{} set exited with {}", self.program, output.status);
            }
            anyhow::bail!("{diagnostic}");
        }

        Ok(())
    }
}

impl Default for GsettingsAppearance {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a `color-scheme` value to a mode. Only `prefer-dark` is dark.
pub fn parse_color_scheme(value: &str) -> AppearanceMode {
    match value {
        "prefer-dark" => AppearanceMode::Dark,
        _ => AppearanceMode::Light,
    }
}

/// Value written to `color-scheme` for a mode.
pub fn color_scheme_value(mode: AppearanceMode) -> &'static str {
    match mode {
        AppearanceMode::Dark => "prefer-dark",
        AppearanceMode::Light => "default",
    }
}

impl AppearanceBackend for GsettingsAppearance {
    fn current_mode(&self) -> AppearanceMode {
        match self.read_color_scheme() {
            Ok(value) => parse_color_scheme(&value),
            Err(e) => {
                log_warning!("Could not read the current appearance: {e}");
                log_indented!("Assuming light mode");
                AppearanceMode::Light
            }
        }
    }

    fn set_mode(&mut self, mode: AppearanceMode) -> Result<()> {
        self.write_color_scheme(color_scheme_value(mode))
            .with_context(|| format!("Failed to switch appearance to {mode}"))
    }

    fn backend_name(&self) -> &'static str {
        "GSettings"
    }
}
