//! sunfollow: keeps the desktop light/dark appearance in step with daylight.
//!
//! There are no command-line flags; everything happens in [`sunfollow::SunFollow`].
//! Fatal errors have already been logged by the time `run` returns, so all that is
//! left here is the exit status.

fn main() {
    if sunfollow::SunFollow::new().run().is_err() {
        std::process::exit(1);
    }
}
