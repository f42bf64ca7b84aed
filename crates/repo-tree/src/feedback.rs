use std::path::Path;

/// Non-fatal diagnostics collected while walking or extracting a repository.
///
/// Operations that keep going past a bad entry return these alongside their
/// result so the caller decides whether to log, surface or drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// An entry was dropped but the rest of the result is intact.
    Warning(String),
    /// Part of the result could not be read at all.
    Error(String),
}

impl Feedback {
    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Warning for an entry that was dropped from the result.
    pub fn skipped(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Warning(format!("skipped {}: {reason}", path.display()))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Warning(msg) | Self::Error(msg) => msg,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning(msg) => write!(f, "warning: {msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
