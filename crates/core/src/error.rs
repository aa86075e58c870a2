use crate::timeline::Phase;

/// Result alias that carries the custom [`MandalaError`] type.
pub type Result<T> = std::result::Result<T, MandalaError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MandalaError {
    /// Free-form error for conditions that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// A boundary starts at or before the boundary preceding it.
    #[error("boundary for {phase} at {start}s does not come after the previous boundary at {previous}s")]
    NonIncreasingBoundary {
        phase: Phase,
        start: f32,
        previous: f32,
    },
    /// Boundaries must list phases in their natural order, each at most once.
    #[error("boundary for {phase} is listed after {previous}")]
    BoundaryOutOfOrder { phase: Phase, previous: Phase },
    /// Boundary timestamps must be finite and non-negative.
    #[error("boundary for {phase} has invalid start time {start}")]
    InvalidBoundaryTime { phase: Phase, start: f32 },
    /// The visual table lacks an entry for a phase.
    #[error("visual table has no entry for {0}")]
    MissingVisualTarget(Phase),
    /// A visual table entry carries out-of-range values.
    #[error("visual target for {phase} is invalid: {reason}")]
    InvalidVisualTarget { phase: Phase, reason: String },
    /// Ring parameters that would produce degenerate geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Wrapper around configuration (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl MandalaError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn geometry<T: Into<String>>(msg: T) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Returns `true` for errors raised while validating configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NonIncreasingBoundary { .. }
                | Self::BoundaryOutOfOrder { .. }
                | Self::InvalidBoundaryTime { .. }
                | Self::MissingVisualTarget(_)
                | Self::InvalidVisualTarget { .. }
        )
    }
}

impl From<&str> for MandalaError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MandalaError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
