//! LookupOutcome - result of a bounded transform lookup
//!
//! A lookup never returns an error type; every failure mode is a value of
//! this module so callers can branch on it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FrameId, LookupTime, StampedTransform, Timestamp};

/// Why a lookup did not produce a transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// Deadline reached before the store could answer
    DeadlineExceeded,
    /// Liveness signal reported shutdown before an answer arrived
    ProcessShuttingDown,
    /// The store raised a computation fault while resolving
    StoreComputationFailed { message: String },
}

impl FailureCause {
    /// Stable label for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            FailureCause::DeadlineExceeded => "deadline_exceeded",
            FailureCause::ProcessShuttingDown => "shutting_down",
            FailureCause::StoreComputationFailed { .. } => "store_error",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::DeadlineExceeded => write!(f, "timed out"),
            FailureCause::ProcessShuttingDown => write!(f, "process is shutting down"),
            FailureCause::StoreComputationFailed { message } => {
                write!(f, "store error: {message}")
            }
        }
    }
}

/// Failed lookup with everything needed to diagnose it.
///
/// `latest_available` distinguishes "transform is stale" (some data exists
/// for the pair) from "transform never existed" (`None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupFailure {
    /// Requested target frame
    pub target_frame: FrameId,
    /// Requested source frame
    pub source_frame: FrameId,
    /// Requested time
    pub requested: LookupTime,
    /// Wall-clock time spent waiting
    pub elapsed: Duration,
    /// Latest time the pair could be resolved at, if any
    pub latest_available: Option<Timestamp>,
    /// Failure cause
    pub cause: FailureCause,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transform lookup {} after {:.1}ms for frame {} to frame {} (requested time: {}), ",
            self.cause,
            self.elapsed.as_secs_f64() * 1000.0,
            self.source_frame,
            self.target_frame,
            self.requested
        )?;
        match self.latest_available {
            Some(t) => write!(f, "latest available at {t}"),
            None => write!(f, "none available"),
        }
    }
}

impl std::error::Error for LookupFailure {}

/// Result of a bounded lookup: the transform, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOutcome {
    Success(StampedTransform),
    Failure(LookupFailure),
}

impl LookupOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Success(_))
    }

    /// The resolved transform, if the lookup succeeded.
    pub fn transform(&self) -> Option<&StampedTransform> {
        match self {
            LookupOutcome::Success(tf) => Some(tf),
            LookupOutcome::Failure(_) => None,
        }
    }

    /// The failure, if the lookup failed.
    pub fn failure(&self) -> Option<&LookupFailure> {
        match self {
            LookupOutcome::Success(_) => None,
            LookupOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<StampedTransform, LookupFailure> {
        match self {
            LookupOutcome::Success(tf) => Ok(tf),
            LookupOutcome::Failure(failure) => Err(failure),
        }
    }
}

impl From<Result<StampedTransform, LookupFailure>> for LookupOutcome {
    fn from(result: Result<StampedTransform, LookupFailure>) -> Self {
        match result {
            Ok(tf) => LookupOutcome::Success(tf),
            Err(failure) => LookupOutcome::Failure(failure),
        }
    }
}
