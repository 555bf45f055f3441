use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by tensor construction, graph operations and training.
///
/// All of them are precondition violations: nothing is retried or corrected and, during training,
/// no parameter is touched once one of them has been returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The shape of a tensor does not agree with its data or with the operation it is fed to.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// The target order is not a bijection over the batch indices.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// A shared weight group received a different number of gradients than registered results.
    #[error("count mismatch: expected {expected} gradients, got {actual}")]
    CountMismatch {
        /// Number of registered results.
        expected: usize,
        /// Number of supplied gradients.
        actual: usize,
    },

    /// Out of range access into a shared weight group.
    #[error("index {index} out of range for length {len}")]
    Index {
        /// Requested index.
        index: usize,
        /// Number of available entries.
        len: usize,
    },

    /// A batch without items was supplied.
    #[error("empty batch")]
    EmptyBatch,

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The image conversion collaborator failed.
    #[error("image conversion failed: {0}")]
    ImageConversion(String),

    /// Malformed JSON configuration.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
