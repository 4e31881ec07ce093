//! Service construction errors.

use std::fmt;

use crate::executor::PoolError;

/// Errors that can occur while assembling the service.
#[derive(Debug)]
pub enum AppError {
    /// Failed to start the blocking pool.
    PoolStart(PoolError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::PoolStart(e) => write!(f, "Failed to start blocking pool: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::PoolStart(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<PoolError> for AppError {
    fn from(e: PoolError) -> Self {
        AppError::PoolStart(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("memory cache size is zero".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: memory cache size is zero"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_pool_error_source() {
        let err: AppError = PoolError::Build {
            label: "store".to_string(),
            reason: "no threads".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Failed to start blocking pool"));
        assert!(err.source().is_some());
    }
}
