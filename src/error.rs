//! Error types for the assembly pass.
use std::fmt;
use std::fmt::{Display, Formatter};

/// Library-wide error type.
///
/// None of these errors are recoverable within a pass: the assembly driver aborts and no
/// partially assembled system is handed out. Contributions to DOFs that are not locally
/// owned are *not* errors; they are skipped (see [`GlobalSystem`](crate::assembly::global::GlobalSystem)).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// Malformed topology or an element whose DOF counts contradict the block layout.
    PreconditionViolation {
        element: usize,
        side: Option<usize>,
        reason: String,
    },
    /// A global system operation was invoked in the wrong state, e.g. zeroing rows
    /// before the system was closed.
    ConsistencyViolation(String),
    /// The configuration was rejected before assembly started.
    InvalidConfiguration(String),
}

impl AssemblyError {
    pub(crate) fn precondition(element: usize, reason: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            element,
            side: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn face_precondition(element: usize, side: usize, reason: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            element,
            side: Some(side),
            reason: reason.into(),
        }
    }
}

impl Display for AssemblyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreconditionViolation {
                element,
                side: Some(side),
                reason,
            } => write!(f, "precondition violated on element {element}, side {side}: {reason}"),
            Self::PreconditionViolation {
                element,
                side: None,
                reason,
            } => write!(f, "precondition violated on element {element}: {reason}"),
            Self::ConsistencyViolation(msg) => write!(f, "global system used inconsistently: {msg}"),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for AssemblyError {}
