//! Unix signal handling for sunfollow.
//!
//! A background thread owned by `signal-hook` receives the signals and forwards
//! their numbers over a channel. It does nothing else: logging and shutdown run on
//! the main loop when it picks the message up.

use anyhow::{Context, Result};
use nix::sys::signal::Signal;
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::{Handle, Signals},
};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// Signals that stop the daemon.
pub const STOP_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGQUIT];

/// Signals caught only so they can be reported instead of killing the process.
pub const REPORTED_SIGNALS: [i32; 3] = [SIGHUP, SIGUSR1, SIGUSR2];

/// Message forwarded from the signal thread to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    Received(i32),
}

/// What the main loop does after a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Stop,
    Ignore,
}

/// Signal handling state owned by the main loop.
pub struct SignalState {
    /// Channel receiver for forwarded signals
    pub signal_receiver: Receiver<SignalMessage>,
    handle: Option<Handle>,
}

impl SignalState {
    /// State without OS registration; messages come only from the returned sender.
    pub fn detached() -> (Self, Sender<SignalMessage>) {
        let (signal_sender, signal_receiver) = channel();
        (
            Self {
                signal_receiver,
                handle: None,
            },
            signal_sender,
        )
    }

    /// Stop the forwarding thread. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }
}

impl Drop for SignalState {
    fn drop(&mut self) {
        self.close();
    }
}

/// Register the signal handlers and start the forwarding thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let (signal_sender, signal_receiver) = channel();

    let mut signals = Signals::new(STOP_SIGNALS.iter().chain(REPORTED_SIGNALS.iter()))
        .context("failed to register signal handlers")?;
    let handle = signals.handle();

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            for sig in signals.forever() {
                if signal_sender.send(SignalMessage::Received(sig)).is_err() {
                    // Main loop is gone
                    break;
                }
            }
        })
        .context("failed to spawn signal thread")?;

    Ok(SignalState {
        signal_receiver,
        handle: Some(handle),
    })
}

/// Handle a signal on the main loop.
///
/// Interrupt, terminate and quit stop the daemon; anything else is reported on
/// the error stream and ignored.
pub fn handle_signal(signo: i32) -> SignalAction {
    if STOP_SIGNALS.contains(&signo) {
        log_block_start!("Stopped following the sun");
        SignalAction::Stop
    } else {
        log_pipe!();
        log_error!("Unhandled signal ({signo}) {}", signal_name(signo));
        SignalAction::Ignore
    }
}

/// Conventional name of a signal number, e.g. `SIGHUP`.
pub fn signal_name(signo: i32) -> &'static str {
    Signal::try_from(signo)
        .map(Signal::as_str)
        .unwrap_or("unknown signal")
}
