//! Error types for the training, evaluation and checkpoint driver.
//!
//! The recurrent core itself does not return errors: a channel mismatch inside
//! a convolution is a programming error and panics in the backend, exactly
//! like any other Burn module. The driver validates batches up front so that
//! user data problems surface as [`PredictoError::ShapeMismatch`] instead.
//!
//! Requesting an accelerator that is not present is deliberately *not* an
//! error. See [`crate::device::resolve`].

use std::path::PathBuf;

use burn::record::RecorderError;
use thiserror::Error;

/// The main error type of the crate.
#[derive(Debug, Error)]
pub enum PredictoError {
    /// A batch or target tensor disagrees with the configured model shape.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Which tensor was being checked.
        context: &'static str,
        /// Expected dimensions (`0` stands for "any size").
        expected: Vec<usize>,
        /// Observed dimensions.
        actual: Vec<usize>,
    },

    /// The configuration cannot describe a valid model.
    #[error("Invalid configuration: {detail}")]
    InvalidConfig {
        /// Description of the problem.
        detail: String,
    },

    /// No checkpoint exists at the requested location.
    #[error("Checkpoint not found at {}", path.display())]
    MissingCheckpoint {
        /// The missing file.
        path: PathBuf,
    },

    /// The checkpoint was written for a different architecture.
    #[error("Checkpoint architecture mismatch: {detail}")]
    ArchitectureMismatch {
        /// Which configuration field differs.
        detail: String,
    },

    /// Burn failed to encode or decode the parameter record.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] RecorderError),

    /// A metric could not be computed for the given frames.
    #[error("Metric error: {reason}")]
    Metric {
        /// Description of the failure.
        reason: String,
    },

    /// The data source yielded no batches.
    #[error("Data source for {operation} yielded no batches")]
    EmptyData {
        /// The driver operation that received no data.
        operation: &'static str,
    },

    /// Filesystem error while reading or writing the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be (de)serialized.
    #[error("Config serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the driver.
pub type Result<T> = std::result::Result<T, PredictoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = PredictoError::ShapeMismatch {
            context: "targets",
            expected: vec![2, 3, 1, 16, 16],
            actual: vec![2, 4, 1, 16, 16],
        };
        let msg = err.to_string();
        assert!(msg.contains("targets"));
        assert!(msg.contains("[2, 3, 1, 16, 16]"));
    }

    #[test]
    fn test_missing_checkpoint_message() {
        let err = PredictoError::MissingCheckpoint {
            path: PathBuf::from("/tmp/nowhere/model.mpk"),
        };
        assert!(err.to_string().contains("/tmp/nowhere/model.mpk"));
    }
}
