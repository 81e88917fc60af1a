use crate::validate::ViolationList;
use thiserror::Error;

/// Failures raised by the normalization engine.
///
/// Source, decode and configuration failures live in the adapters and are
/// reported through `anyhow` with the identifying context attached.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// A nested raw structure could not be mapped onto the canonical model.
    #[error("failed to parse {field}: {reason}")]
    Parse { field: String, reason: String },

    /// The canonical application violated one or more model invariants.
    #[error("application {name:?} failed validation:{violations}")]
    Validation {
        name: String,
        violations: ViolationList,
    },

    /// The canonical application and its generic content did not convert
    /// into one another.
    #[error("failed to convert application content: {0}")]
    Content(#[from] serde_json::Error),
}
