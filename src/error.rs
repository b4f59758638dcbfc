//! Suspend signalling and configuration errors.
//!
//! The dominant recoverable condition in the viewport is data that is still
//! streaming in (terrain cuts, actor positions, attachment transforms).
//! That is modeled as an explicit [`Suspend`] value threaded through
//! `Result`, caught at frame boundaries; it is not a failure and nothing in
//! this crate treats it as one.

use std::borrow::Cow;
use thiserror::Error;

/// Data needed this frame has not arrived yet. Callers skip the affected
/// subsystem's work for the frame, leave its state untouched, and retry on
/// the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("waiting for {cause}")]
pub struct Suspend {
    pub cause: Cow<'static, str>,
}

impl Suspend {
    pub fn new(cause: impl Into<Cow<'static, str>>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Viewport-level errors. None of these are fatal: suspends retry next
/// frame, configuration problems fall back to defaults.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Suspend(#[from] Suspend),
    /// Unknown camera identifier or malformed persisted arguments.
    #[error("camera configuration: {0}")]
    Config(String),
}
