//! Error types for sensor operations.

use thiserror::Error;

/// Errors that can occur when working with sensor data.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Buffer size mismatch (e.g., image buffer wrong size).
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected buffer size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// A calibration matrix cannot be inverted.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    /// Calibration data contains non-finite values.
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
}

impl SensorError {
    /// Creates a buffer size mismatch error.
    #[must_use]
    pub const fn buffer_mismatch(expected: usize, actual: usize) -> Self {
        Self::BufferSizeMismatch { expected, actual }
    }

    /// Creates a singular matrix error.
    #[must_use]
    pub fn singular(context: impl Into<String>) -> Self {
        Self::SingularMatrix(context.into())
    }

    /// Creates an invalid calibration error.
    #[must_use]
    pub fn invalid_calibration(reason: impl Into<String>) -> Self {
        Self::InvalidCalibration(reason.into())
    }
}

/// Result type for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_buffer_mismatch() {
        let err = SensorError::buffer_mismatch(100, 50);
        let msg = format!("{err}");
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn error_singular() {
        let err = SensorError::singular("rotation");
        let msg = format!("{err}");
        assert!(msg.contains("singular matrix"));
        assert!(msg.contains("rotation"));
    }

    #[test]
    fn error_invalid_calibration() {
        let err = SensorError::invalid_calibration("NaN in forward matrix");
        assert!(err.to_string().contains("invalid calibration"));
    }
}
