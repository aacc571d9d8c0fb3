use std::error::Error;
use std::fmt;

/// Errors surfaced by loss computations and network construction.
///
/// Every variant is an invalid-argument failure: the offending call produces
/// no partial result, and nothing in the crate retries or recovers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// Array dimensions incompatible between two collaborating operands.
    ShapeMismatch {
        /// Which operation rejected its inputs (e.g. "softmax_loss", "conv_forward").
        context: &'static str,
        expected: String,
        found: String,
    },
    /// A label outside [0, num_classes).
    LabelOutOfRange {
        index: usize,
        label: usize,
        num_classes: usize,
    },
    /// A network configuration that can never produce valid shapes
    /// (e.g. an even filter size, or an odd input side that breaks pooling).
    BadConfig(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::ShapeMismatch { context, expected, found } => {
                write!(f, "{context}: shape mismatch (expected {expected}, found {found})")
            }
            NetError::LabelOutOfRange { index, label, num_classes } => {
                write!(f, "label {label} at position {index} is outside [0, {num_classes})")
            }
            NetError::BadConfig(msg) => write!(f, "bad network configuration: {msg}"),
        }
    }
}

impl Error for NetError {}
