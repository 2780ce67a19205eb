//! Structured logging system with visual formatting.
//!
//! This module provides the logging system for sunfollow's console output. Every
//! message is written twice: the decorated text (box drawing, ANSI colors) goes to
//! stdout or stderr for a human watching the terminal, and a plain rendition goes to
//! the process-wide structured sink (the systemd journal when available).
//!
//! Each call is synchronous: the stream is flushed and the sink has received the
//! record before the macro returns.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Process-wide structured sink. Installed once at startup, released by `SinkGuard`.
static STRUCTURED_SINK: Mutex<Option<Box<dyn LogSink>>> = Mutex::new(None);

/// Glyphs used purely for the terminal layout.
const FRAME_GLYPHS: &[char] = &['┃', '┣', '┏', '┗', '╹', '━', '╸'];

/// Output stream a message is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    /// Severity the structured sink records for this stream.
    pub fn level(self) -> LogLevel {
        match self {
            Stream::Stdout => LogLevel::Info,
            Stream::Stderr => LogLevel::Error,
        }
    }
}

/// Severity attached to a structured log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Destination for plain-text log records.
///
/// Implementations receive one line at a time with all terminal decoration removed.
/// They must not fail: a sink that cannot deliver a record drops it.
pub trait LogSink: Send {
    fn emit(&mut self, level: LogLevel, text: &str);
}

/// Main logging interface.
///
/// ## Logging Conventions
///
/// - **`log_version!`**: startup header, printed once. Output: `┏ sunfollow vX.Y.Z ━━╸`.
/// - **`log_block_start!`**: opens a new conceptual block (`┃` spacer, then `┣ message`).
/// - **`log_decorated!`**: a line inside the current block (`┣ message`).
/// - **`log_indented!`**: detail belonging to the previous line (`┃   message`).
/// - **`log_pipe!`**: a lone `┃` for spacing before a semantic message.
/// - **`log_end!`**: final marker at shutdown (`╹`).
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_error_exit!`**: semantic
///   messages with a colored `[LEVEL]` tag. Warnings and errors go to stderr.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Install the process-wide structured sink.
    ///
    /// The sink stays active until the returned guard is dropped. Only one sink can
    /// be active at a time.
    pub fn install_sink(sink: Box<dyn LogSink>) -> anyhow::Result<SinkGuard> {
        let mut slot = lock_sink();
        if slot.is_some() {
            anyhow::bail!("Structured log sink already initialized");
        }
        *slot = Some(sink);
        Ok(SinkGuard { _private: () })
    }

    /// Whether a structured sink is currently installed.
    pub fn has_sink() -> bool {
        lock_sink().is_some()
    }
}

/// Guard for the structured sink that releases it on drop.
pub struct SinkGuard {
    _private: (),
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        let released = lock_sink().take();
        drop(released);
    }
}

// A panic while a sink held the lock must not silence every later log call.
fn lock_sink() -> MutexGuard<'static, Option<Box<dyn LogSink>>> {
    STRUCTURED_SINK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Remove ANSI escape sequences from text.
///
/// CSI sequences (`ESC [` parameters, then a final byte in `@`..`~`) are removed
/// whole, which covers both color (`…m`) and erase (`…K`) codes. Any other escape
/// drops the ESC and the byte after it. The result never contains `\x1b`.
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('[') => {
                // Skip parameters and intermediates up to the final byte
                for ch in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&ch) {
                        break;
                    }
                }
            }
            // Lone or two-byte escape
            Some(_) | None => {}
        }
    }

    result
}

/// Reduce a formatted console message to the lines sent to the structured sink.
///
/// ANSI sequences and frame glyphs are removed; lines left empty are dropped.
pub fn plain_lines(text: &str) -> Vec<String> {
    strip_ansi_codes(text)
        .lines()
        .map(|line| {
            line.trim_matches(|c: char| FRAME_GLYPHS.contains(&c) || c.is_whitespace())
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Write a formatted message to `stream` and forward its plain text to the sink.
///
/// Public because the logging macros expand to it.
pub fn emit(stream: Stream, text: &str) {
    {
        let mut slot = lock_sink();
        if let Some(sink) = slot.as_mut() {
            let level = stream.level();
            for line in plain_lines(text) {
                sink.emit(level, &line);
            }
        }
    }

    match stream {
        Stream::Stdout => {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
        Stream::Stderr => {
            let mut err = std::io::stderr().lock();
            let _ = err.write_all(text.as_bytes());
            let _ = err.flush();
        }
    }
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block or for standalone emphasis.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(Stream::Stdout, &format!("┣ {message}\n"));
        }
    }};
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(Stream::Stdout, &format!("┃   {message}\n"));
        }
    }};
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            $crate::common::logger::emit(Stream::Stdout, "┃\n");
        }
    }};
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(Stream::Stdout, &format!("┃\n┣ {message}\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let name = $crate::common::constants::APP_NAME;
            let version = env!("CARGO_PKG_VERSION");
            $crate::common::logger::emit(Stream::Stdout, &format!("┏ {name} v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            $crate::common::logger::emit(Stream::Stdout, "╹\n");
        }
    }};
}

/// Log an informational message with pipe prefix and green-colored tag.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(
                Stream::Stdout,
                &format!("┣[\x1b[32mINFO\x1b[0m] {message}\n"),
            );
        }
    }};
}

/// Log a warning message with pipe prefix and yellow-colored tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(
                Stream::Stderr,
                &format!("┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
            );
        }
    }};
}

/// Log an error message with pipe prefix and red-colored tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(
                Stream::Stderr,
                &format!("┣[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
}

/// Log an error detail line on stderr, indented under the previous error.
#[macro_export]
macro_rules! log_error_indented {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(Stream::Stderr, &format!("┃   {message}\n"));
        }
    }};
}

/// Log an error message with a pipe prefix and terminal corner.
/// Used for the last line before the process gives up.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {{
        use $crate::common::logger::{Log, Stream};
        if Log::is_enabled() {
            let message = format!($($arg)*);
            $crate::common::logger::emit(
                Stream::Stderr,
                &format!("┃\n┗[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
}
