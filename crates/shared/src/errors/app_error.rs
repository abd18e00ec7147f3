use super::DomainError;
use thiserror::Error;

/// Application-level errors (includes infrastructure)
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Request timeout")]
    Timeout,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Domain(e) => match e {
                DomainError::AtCapacity(_)
                | DomainError::AlreadyBooked { .. }
                | DomainError::AlreadyCheckedIn(_) => 409, // Conflict
                DomainError::ProgramNotFound(_)
                | DomainError::LocationNotFound(_)
                | DomainError::ScheduleNotFound(_)
                | DomainError::ExceptionNotFound(_)
                | DomainError::SessionNotFound(_)
                | DomainError::BookingNotFound(_)
                | DomainError::AttendanceNotFound(_) => 404, // Not Found
                // Underflow means the booking invariants were violated
                // somewhere upstream; surface it as a server fault.
                DomainError::CounterUnderflow(_) => 500,
                _ => 400, // Bad Request
            },
            AppError::Database(_) | AppError::Internal(_) => 500, // Internal Server Error
            AppError::Conflict(_) => 409,
            AppError::Unauthorized => 401,
            AppError::Forbidden => 403,
            AppError::NotFound(_) => 404,
            AppError::Validation(_) => 400,
            AppError::Timeout => 504, // Gateway Timeout
        }
    }

    /// Whether a client may reasonably retry the failed request.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Domain(e) => matches!(
                e,
                DomainError::AtCapacity(_)
                    | DomainError::TooEarly { .. }
                    | DomainError::TooLate { .. }
                    | DomainError::OutOfRange { .. }
            ),
            AppError::Database(_)
            | AppError::Conflict(_)
            | AppError::Internal(_)
            | AppError::Timeout => true,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Log the actual error but don't expose details
        tracing::error!("Database error: {:?}", err);
        AppError::Database(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::from(DomainError::AtCapacity("sched_x#2025-01-06".into())).status_code(),
            409
        );
        assert_eq!(
            AppError::from(DomainError::SessionNotFound("s".into())).status_code(),
            404
        );
        assert_eq!(
            AppError::from(DomainError::TooEarly { minutes: 40 }).status_code(),
            400
        );
        assert_eq!(
            AppError::from(DomainError::CounterUnderflow("s".into())).status_code(),
            500
        );
        assert_eq!(AppError::Forbidden.status_code(), 403);
        assert_eq!(AppError::Validation("bad".into()).status_code(), 400);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::from(DomainError::AtCapacity("s".into())).is_retryable());
        assert!(AppError::Conflict("tx".into()).is_retryable());
        assert!(!AppError::from(DomainError::AlreadyCancelled("b".into())).is_retryable());
        assert!(!AppError::Forbidden.is_retryable());
    }
}
