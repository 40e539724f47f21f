//! Error types for table administration operations

use serde::Serialize;
use thiserror::Error;

use crate::executor::ExecutionFailure;

/// Broad category of an [`AdminError`], used for status mapping and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Database,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Database => "database",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while administering tables
///
/// Validation, not-found and conflict outcomes are resolved before any DDL
/// reaches the database. `Database` wraps a failed statement together with
/// the SQL that was attempted.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {message}")]
    Database {
        /// Driver message
        message: String,
        /// SQLSTATE reported by PostgreSQL, if any
        code: Option<String>,
        /// Statement that was being executed
        sql: Option<String>,
        /// Bound parameters, secrets masked
        params: Option<serde_json::Value>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AdminError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![msg.into()],
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wrap a collaborator failure together with the statement that caused it
    pub fn database(
        failure: ExecutionFailure,
        sql: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        Self::Database {
            message: failure.message,
            code: failure.code,
            sql: Some(sql.into()),
            params,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::Validation { .. } => ErrorKind::Validation,
            AdminError::NotFound(_) => ErrorKind::NotFound,
            AdminError::Conflict(_) => ErrorKind::Conflict,
            AdminError::Database { .. } => ErrorKind::Database,
            AdminError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// SQLSTATE of a database error
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            AdminError::Database { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<ExecutionFailure> for AdminError {
    fn from(failure: ExecutionFailure) -> Self {
        Self::Database {
            message: failure.message,
            code: failure.code,
            sql: None,
            params: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
