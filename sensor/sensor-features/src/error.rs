//! Error types for the feature extraction crate.

use sensor_types::SensorError;
use thiserror::Error;

/// Errors that can occur when configuring feature extraction.
///
/// Per-frame input problems never surface as errors; they degrade the
/// affected stage to an empty output instead.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A parameter is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool for plane detection could not be created.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Calibration or raw sensor data was rejected.
    #[error(transparent)]
    Sensor(#[from] SensorError),
}

impl FeatureError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a worker pool error.
    #[must_use]
    pub fn worker_pool(reason: impl Into<String>) -> Self {
        Self::WorkerPool(reason.into())
    }
}

/// Result type for feature extraction operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = FeatureError::invalid_config("num_lines must be positive");
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("num_lines"));
    }

    #[test]
    fn error_worker_pool() {
        let err = FeatureError::worker_pool("spawn failed");
        assert!(err.to_string().contains("worker pool"));
    }

    #[test]
    fn error_from_sensor() {
        let err: FeatureError = SensorError::singular("rotation").into();
        assert!(matches!(err, FeatureError::Sensor(_)));
        assert!(err.to_string().contains("rotation"));
    }
}
