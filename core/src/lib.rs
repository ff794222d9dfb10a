//! Root of the `armgrab-core` library.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the reporting sink owned by the
// front-end, or the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod error;
pub mod oci;
pub mod plan;
pub mod retry;

pub use error::GrabError;
pub use plan::LaunchPlan;
pub use retry::{RetryConfig, RetryController, RunOutcome};
