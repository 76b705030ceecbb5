//! Layered error definitions
//!
//! Categorized by source: config / store

use thiserror::Error;

use crate::{FrameId, Timestamp};

/// Unified error type for configuration and IO
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a transform store.
///
/// Split in two families: "unavailable" errors mean the data may still
/// arrive, everything else is a computation fault that waiting cannot fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Frame has never been published
    #[error("frame '{0}' does not exist")]
    UnknownFrame(FrameId),

    /// Frame exists but holds no samples
    #[error("frame '{0}' has no transform data")]
    NoData(FrameId),

    /// Requested time is newer than the newest sample
    #[error(
        "lookup would require extrapolation into the future for frame '{frame}': \
         requested {requested}, newest data at {newest}"
    )]
    ExtrapolationFuture {
        frame: FrameId,
        requested: Timestamp,
        newest: Timestamp,
    },

    /// Requested time is older than the retained history
    #[error(
        "lookup would require extrapolation into the past for frame '{frame}': \
         requested {requested}, oldest data at {oldest}"
    )]
    ExtrapolationPast {
        frame: FrameId,
        requested: Timestamp,
        oldest: Timestamp,
    },

    /// Both frames exist but share no ancestor
    #[error("frames '{target_frame}' and '{source_frame}' are not part of the same tree")]
    Disconnected {
        target_frame: FrameId,
        source_frame: FrameId,
    },

    /// Parent chain exceeded the maximum depth
    #[error("parent chain of frame '{0}' exceeds max depth, the frame graph contains a loop")]
    LoopDetected(FrameId),

    /// Rejected on insertion
    #[error("invalid transform from '{parent}' to '{child}': {reason}")]
    InvalidTransform {
        parent: FrameId,
        child: FrameId,
        reason: String,
    },

    /// Sample older than the retention window
    #[error("dropped stale transform for frame '{frame}' at {stamp}, oldest retained {oldest}")]
    StaleData {
        frame: FrameId,
        stamp: Timestamp,
        oldest: Timestamp,
    },
}

impl TransformError {
    /// Whether the failure may resolve once more data is delivered.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TransformError::UnknownFrame(_)
                | TransformError::NoData(_)
                | TransformError::ExtrapolationFuture { .. }
        )
    }

    pub fn invalid(
        parent: impl Into<FrameId>,
        child: impl Into<FrameId>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTransform {
            parent: parent.into(),
            child: child.into(),
            reason: reason.into(),
        }
    }
}
