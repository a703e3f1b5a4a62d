// app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use workflow::WorkflowError;

/// Every failure the bookstore surfaces, tagged by kind so callers can branch
/// on the variant instead of matching message text.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  /// Bad credentials, bad or expired token, or a token whose user is gone.
  #[error("Authentication Failed: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  /// Duplicate email on registration or profile update.
  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// Any data-access failure, carrying the store's own message.
  #[error("Store Error: {0}")]
  Store(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: WorkflowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Stable machine-readable kind, used as the `error` field of response bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_failed",
      AppError::Unauthorized(_) => "unauthorized",
      AppError::Forbidden(_) => "forbidden",
      AppError::Conflict(_) => "conflict",
      AppError::NotFound(_) => "not_found",
      AppError::Store(_) => "store_error",
      AppError::Config(_) => "configuration_error",
      AppError::Workflow { .. } => "workflow_error",
      AppError::Internal(_) => "internal_error",
    }
  }

  /// The message shown to API callers. Internal details of store, config and
  /// workflow failures stay in the logs.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::Unauthorized(m)
      | AppError::Forbidden(m)
      | AppError::Conflict(m)
      | AppError::NotFound(m) => m.clone(),
      AppError::Store(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Workflow { .. } => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl From<sqlx::Error> for AppError {
  fn from(err: sqlx::Error) -> Self {
    match err {
      sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
      other => AppError::Store(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Store(_) | AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    if self.status_code().is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::debug!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(self.status_code()).json(json!({
      "error": self.kind(),
      "message": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
