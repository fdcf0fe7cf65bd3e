//! Error types for hornflow.

use thiserror::Error;

/// Result alias for hornflow operations.
pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// Errors raised by hornflow operators at the call site.
///
/// Numerical anomalies (overflow to infinity, NaN appearing during the
/// iteration) are not errors; they propagate into the output fields.
#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    /// A field was constructed with a zero extent.
    #[error("invalid field dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },
    /// The row stride is smaller than the field width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride {
        /// Field width in elements.
        width: usize,
        /// Offending stride in elements.
        stride: usize,
    },
    /// The backing buffer cannot hold the requested view.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall {
        /// Minimum number of elements required.
        needed: usize,
        /// Number of elements provided.
        got: usize,
    },
    /// An input matrix disagrees with the operator's configured shape.
    #[error(
        "`{context}' has shape {got_height}x{got_width}, expected {height}x{width}"
    )]
    ShapeMismatch {
        /// Configured height.
        height: usize,
        /// Configured width.
        width: usize,
        /// Height of the offending matrix.
        got_height: usize,
        /// Width of the offending matrix.
        got_width: usize,
        /// Name of the offending argument.
        context: &'static str,
    },
    /// A kernel slice does not hold exactly three taps.
    #[error("kernel must have exactly 3 taps, got {got}")]
    KernelLength {
        /// Number of taps provided.
        got: usize,
    },
    /// A kernel tap is NaN or infinite.
    #[error("kernel tap {index} is not finite ({value})")]
    KernelNotFinite {
        /// Index of the offending tap.
        index: usize,
        /// Offending tap value.
        value: f64,
    },
    /// The regularisation weight alpha is NaN or infinite.
    #[error("alpha must be finite, got {value}")]
    NonFiniteAlpha {
        /// Offending alpha value.
        value: f64,
    },
}
