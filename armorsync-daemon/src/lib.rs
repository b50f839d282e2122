//! Polling daemon: preflight once, then mirror the profiles directory on
//! every poll interval until shutdown.

mod error;
pub mod logging;
mod runtime;

pub use error::DaemonError;
pub use logging::init_tracing;
pub use runtime::{run, run_with_shutdown, start_blocking, RunStats};
