//! Trail-condition inference for Trailcast
//!
//! Turns a multi-day weather series into a discrete verdict: a color level,
//! human-readable reasons, and a short trend prediction. Inference is pure
//! and deterministic; [`service::ConditionService`] adds the cached,
//! coordinate-keyed entry point.

pub mod infer;
pub mod moisture;
pub mod service;

pub use infer::{ConditionEngine, ConditionLevel, InferenceResult, Thresholds};
pub use moisture::MoistureModel;
pub use service::ConditionService;

/// Inference errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// The input series had no days. A caller bug; never retried.
    #[error("weather series is empty")]
    EmptySeries,
}

impl InferenceError {
    /// A UI-appropriate message for this error.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            InferenceError::EmptySeries => "No weather data available for this location.",
        }
    }
}
