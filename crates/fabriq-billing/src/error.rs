use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the billing engine
#[derive(Debug, Error)]
pub enum BillingError {
    /// Equipment has no configured access policy; callers must treat the
    /// equipment as inaccessible until one exists.
    #[error("No access policy configured for equipment {equipment_id}")]
    PolicyNotFound { equipment_id: String },

    /// Negative session durations are a caller error, rejected up front.
    #[error("Invalid session duration: {minutes} minutes")]
    InvalidDuration { minutes: i64 },

    /// Pay-per-use policy with incomplete pricing; never billed as zero.
    #[error("Misconfigured policy for equipment {equipment_id}: {reason}")]
    MisconfiguredPolicy { equipment_id: String, reason: String },

    /// Field-level validation failure on a policy write.
    #[error("Validation failed for {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Storage backend failure; the only infrastructure error class.
    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] fabriq_common::ConfigurationError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BillingError>;

impl BillingError {
    /// Stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::PolicyNotFound { .. } => "FABRIQ_BILLING_POLICY_NOT_FOUND",
            BillingError::InvalidDuration { .. } => "FABRIQ_BILLING_INVALID_DURATION",
            BillingError::MisconfiguredPolicy { .. } => "FABRIQ_BILLING_MISCONFIGURED_POLICY",
            BillingError::ValidationError { .. } => "FABRIQ_BILLING_VALIDATION_ERROR",
            BillingError::Storage { .. } => "FABRIQ_BILLING_STORAGE_ERROR",
            BillingError::Config(_) => "FABRIQ_BILLING_CONFIG_ERROR",
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Storage { .. })
    }

    /// Check if error is a client error
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BillingError::PolicyNotFound { .. }
                | BillingError::InvalidDuration { .. }
                | BillingError::MisconfiguredPolicy { .. }
                | BillingError::ValidationError { .. }
        )
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BillingError::PolicyNotFound { .. } => StatusCode::NOT_FOUND,
            BillingError::InvalidDuration { .. } => StatusCode::BAD_REQUEST,
            BillingError::MisconfiguredPolicy { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            BillingError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now(),
                "retryable": self.is_retryable(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BillingError::PolicyNotFound {
                equipment_id: "laser-1".to_string()
            }
            .error_code(),
            "FABRIQ_BILLING_POLICY_NOT_FOUND"
        );
        assert_eq!(
            BillingError::InvalidDuration { minutes: -3 }.error_code(),
            "FABRIQ_BILLING_INVALID_DURATION"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(BillingError::InvalidDuration { minutes: -1 }.is_client_error());
        assert!(BillingError::MisconfiguredPolicy {
            equipment_id: "laser-1".to_string(),
            reason: "missing costUnit".to_string()
        }
        .is_client_error());
        assert!(!BillingError::Storage {
            operation: "record".to_string(),
            source: "boom".into(),
        }
        .is_client_error());
    }

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(BillingError::Storage {
            operation: "get".to_string(),
            source: "timeout".into(),
        }
        .is_retryable());
        assert!(!BillingError::PolicyNotFound {
            equipment_id: "laser-1".to_string()
        }
        .is_retryable());
    }
}
