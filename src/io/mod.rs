// External I/O operations module
pub mod journal; // Structured log sinks (systemd journal)
pub mod signals; // Unix signal handling
