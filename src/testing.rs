//! In-memory collaborators for tests.
//!
//! Each fake is a cheap handle around shared state: keep a clone, hand the other
//! to [`SunFollow`](crate::SunFollow), and inspect or steer the shared state from
//! the test thread while the daemon runs.

use anyhow::{Result, anyhow};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::appearance::{AppearanceBackend, AppearanceMode};
use crate::geo::{SunDial, SunStatusSource};

// 2024-06-21 03:43 UTC and 20:21 UTC, London
const SUNRISE: f64 = 1_718_941_380.0;
const SUNSET: f64 = 1_719_001_260.0;

struct SunState {
    is_daylight: AtomicBool,
    available: AtomicBool,
    queries: AtomicUsize,
}

/// Sun status source with a switchable daylight flag.
#[derive(Clone)]
pub struct FakeSunStatus {
    state: Arc<SunState>,
}

impl FakeSunStatus {
    fn with(is_daylight: bool, available: bool) -> Self {
        Self {
            state: Arc::new(SunState {
                is_daylight: AtomicBool::new(is_daylight),
                available: AtomicBool::new(available),
                queries: AtomicUsize::new(0),
            }),
        }
    }

    pub fn daylight() -> Self {
        Self::with(true, true)
    }

    pub fn night() -> Self {
        Self::with(false, true)
    }

    /// A source whose schedule is never available.
    pub fn unavailable() -> Self {
        Self::with(false, false)
    }

    pub fn set_daylight(&self, is_daylight: bool) {
        self.state.is_daylight.store(is_daylight, Ordering::SeqCst);
    }

    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::SeqCst);
    }

    /// Number of queries answered or refused so far.
    pub fn queries(&self) -> usize {
        self.state.queries.load(Ordering::SeqCst)
    }
}

impl SunStatusSource for FakeSunStatus {
    fn query(&self) -> Result<SunDial> {
        self.state.queries.fetch_add(1, Ordering::SeqCst);
        if !self.state.available.load(Ordering::SeqCst) {
            return Err(anyhow!("No known location for time zone Etc/Unknown"));
        }
        Ok(SunDial {
            sunrise: SUNRISE,
            sunset: SUNSET,
            is_daylight: self.state.is_daylight.load(Ordering::SeqCst),
        })
    }
}

struct DesktopState {
    mode: AppearanceMode,
    set_calls: Vec<AppearanceMode>,
    failure: Option<String>,
}

/// Appearance backend that records every switch request.
#[derive(Clone)]
pub struct FakeAppearance {
    state: Arc<Mutex<DesktopState>>,
}

impl FakeAppearance {
    pub fn new(mode: AppearanceMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(DesktopState {
                mode,
                set_calls: Vec::new(),
                failure: None,
            })),
        }
    }

    /// A backend whose every switch fails with `diagnostic`.
    pub fn failing(mode: AppearanceMode, diagnostic: &str) -> Self {
        let fake = Self::new(mode);
        fake.lock().failure = Some(diagnostic.to_string());
        fake
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mode(&self) -> AppearanceMode {
        self.lock().mode
    }

    /// Change the appearance behind the daemon's back, like a user would.
    pub fn change_externally(&self, mode: AppearanceMode) {
        self.lock().mode = mode;
    }

    /// Every mode passed to `set_mode`, in order, including failed attempts.
    pub fn set_calls(&self) -> Vec<AppearanceMode> {
        self.lock().set_calls.clone()
    }
}

impl AppearanceBackend for FakeAppearance {
    fn current_mode(&self) -> AppearanceMode {
        self.mode()
    }

    fn set_mode(&mut self, mode: AppearanceMode) -> Result<()> {
        let mut state = self.lock();
        state.set_calls.push(mode);
        if let Some(diagnostic) = &state.failure {
            return Err(anyhow!("{diagnostic}"));
        }
        state.mode = mode;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Fake"
    }
}
