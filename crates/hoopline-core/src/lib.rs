//! hoopline core - shared machinery for resumable, rate-limited acquisition
//!
//! Error classification, the blocking HTTP bridge, the batch runner, and
//! the logging / progress / shutdown plumbing used by the binary.

pub mod error;
pub mod http;
pub mod logging;
pub mod progress;
pub mod runner;
pub mod shutdown;

// Re-exports for convenience
pub use error::{FetchError, RunError};
pub use http::{build_client, get_text};
pub use logging::init_logging;
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use runner::{BatchRunner, BatchSummary, Pacing, finish_bar};
pub use shutdown::{install_signal_handlers, shutdown_flag};
