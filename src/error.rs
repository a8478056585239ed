use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Invalid shard cluster configuration, detected at startup
    ConfigError(String),
    /// Resolution attempted before the registry reached the Ready state
    NotInitialized(String),
    InvalidOwnerId(i64),
    InvalidShard(u32),
    InvalidSequence(u32),
    InvalidTimestamp(i64),
    UnknownCluster(String),
    InvalidTableName(String),
    Database(anyhow::Error),
    DatabaseError(String),
    BadRequest(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::NotInitialized(msg) => write!(f, "Not initialized: {}", msg),
            AppError::InvalidOwnerId(id) => {
                write!(f, "Invalid owner id: {} (owner ids must be non-negative)", id)
            }
            AppError::InvalidShard(shard) => {
                write!(f, "Invalid shard: {} does not fit in the 13-bit shard field", shard)
            }
            AppError::InvalidSequence(seq) => {
                write!(f, "Invalid sequence: {} does not fit in the 10-bit sequence field", seq)
            }
            AppError::InvalidTimestamp(ts) => {
                write!(f, "Invalid timestamp: {} is outside the 41-bit window after the epoch", ts)
            }
            AppError::UnknownCluster(name) => write!(f, "Unknown shard cluster: {}", name),
            AppError::InvalidTableName(name) => write!(f, "Invalid table name: {}", name),
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidOwnerId(_)
            | AppError::InvalidShard(_)
            | AppError::InvalidSequence(_)
            | AppError::InvalidTimestamp(_)
            | AppError::InvalidTableName(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownCluster(_) => StatusCode::NOT_FOUND,
            AppError::NotInitialized(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ConfigError(_)
            | AppError::Database(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_) => {
                tracing::error!("{}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error_message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = AppError::InvalidOwnerId(-1).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::UnknownCluster("users".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::NotInitialized("registry".into()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = AppError::ConfigError("odd shards".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::InvalidShard(8192).to_string(),
            "Invalid shard: 8192 does not fit in the 13-bit shard field"
        );
        assert!(AppError::UnknownCluster("users".into())
            .to_string()
            .contains("users"));
    }
}
