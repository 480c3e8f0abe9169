//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Logging/metrics → Bind listener → Serve
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → Servers drain and exit
//! ```

pub mod signals;

pub use signals::{spawn_signal_handler, wait_for_signal, Shutdown};
