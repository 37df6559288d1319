//! Progress reporting trait for the extraction pipeline.
//!
//! Decouples progress reporting from any specific rendering backend.
//! The candidate count is unknown up front (the pipeline is lazy), so the
//! interface is delta-based; an `indicatif` implementation is provided
//! upstream in the CLI utilities crate.

use std::sync::Arc;

/// Trait for reporting pipeline progress.
///
/// Implementations must be `Send + Sync` to support `Arc`-based sharing.
pub trait ProgressCallback: Send + Sync {
    /// Advance progress by `delta` candidates.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op [`ProgressCallback`] for tests and non-interactive callers.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
