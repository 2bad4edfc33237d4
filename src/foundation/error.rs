/// Convenience result type used across cutpaste.
pub type CutPasteResult<T> = Result<T, CutPasteError>;

/// Top-level error taxonomy used by generator APIs.
#[derive(thiserror::Error, Debug)]
pub enum CutPasteError {
    /// Invalid inputs: mismatched buffer sizes, missing files, malformed split lists.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid generator configuration (for example an unknown blend mode).
    #[error("config error: {0}")]
    Config(String),

    /// An object or background asset could not be used.
    #[error("asset error: {0}")]
    Asset(String),

    /// Gradient-domain solve failed (in-process or external).
    #[error("solver error: {0}")]
    Solver(String),

    /// Per-image annotation files could not be merged.
    #[error("merge error: {0}")]
    Merge(String),

    /// The run was interrupted.
    #[error("cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CutPasteError {
    /// Build a [`CutPasteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CutPasteError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CutPasteError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`CutPasteError::Solver`] value.
    pub fn solver(msg: impl Into<String>) -> Self {
        Self::Solver(msg.into())
    }

    /// Build a [`CutPasteError::Merge`] value.
    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge(msg.into())
    }

    /// Build a [`CutPasteError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CutPasteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
