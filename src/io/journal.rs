//! Structured log sinks.
//!
//! The console logger forwards a plain-text copy of every message to one of these.
//! On systemd hosts that is the journal, reached through `tracing-journald`;
//! elsewhere the records are discarded.
//!
//! The journal layer lives in its own `tracing` dispatcher that is only entered
//! while a record is emitted, so tracing output from dependencies (zbus) never
//! reaches the journal under sunfollow's identifier.

use anyhow::{Context, Result};
use nix::unistd::{Pid, getppid};
use tracing::Dispatch;
use tracing_subscriber::prelude::*;

use crate::common::constants::*;
use crate::common::logger::{LogLevel, LogSink};

/// Sink writing records to the systemd journal.
///
/// Every record carries `SYSLOG_IDENTIFIER=sunfollow` and a `SUNFOLLOW_CATEGORY`
/// field; the journal layer maps the level to `PRIORITY`.
pub struct JournalSink {
    dispatch: Dispatch,
    category: &'static str,
}

impl JournalSink {
    /// Connect to the system journal.
    pub fn connect() -> Result<Self> {
        let layer = tracing_journald::layer()
            .context("Failed to connect to the systemd journal")?
            .with_field_prefix(None)
            .with_syslog_identifier(APP_NAME.to_string());

        Ok(Self::with_dispatch(Dispatch::new(
            tracing_subscriber::registry().with(layer),
        )))
    }

    fn with_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            category: log_category(),
        }
    }
}

impl LogSink for JournalSink {
    fn emit(&mut self, level: LogLevel, text: &str) {
        let category = self.category;
        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Info => tracing::info!(sunfollow_category = category, "{text}"),
            LogLevel::Error => tracing::error!(sunfollow_category = category, "{text}"),
        });
    }
}

/// Sink that drops every record.
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&mut self, _level: LogLevel, _text: &str) {}
}

/// Open the best available sink for this host.
pub fn open_default_sink() -> Box<dyn LogSink> {
    match JournalSink::connect() {
        Ok(sink) => Box::new(sink),
        Err(_) => Box::new(NullSink),
    }
}

/// Category of this process: `daemon` when started by init, `default` otherwise.
pub fn log_category() -> &'static str {
    if getppid() == Pid::from_raw(1) {
        LOG_CATEGORY_DAEMON
    } else {
        LOG_CATEGORY_DEFAULT
    }
}
