//! SQL execution collaborator
//!
//! The service never talks to a driver directly. It is handed an
//! implementation of [`SqlExecutor`], which runs statements with named
//! parameters, opens transactions and quotes literals.

use async_trait::async_trait;
use thiserror::Error;

use crate::sql::params::NamedParams;

pub mod postgres;

pub use postgres::PgExecutor;

/// SQLSTATE codes the service reacts to
pub mod sqlstate {
    pub const DUPLICATE_TABLE: &str = "42P07";
    pub const DUPLICATE_COLUMN: &str = "42701";
    pub const UNDEFINED_TABLE: &str = "42P01";
    pub const UNDEFINED_COLUMN: &str = "42703";
}

/// Rows returned by a statement, each decoded into a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in result order (empty when no row was returned)
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl ResultSet {
    pub fn new(
        columns: Vec<String>,
        rows: Vec<serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        Self { columns, rows }
    }

    pub fn first(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.rows.first()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_values(self) -> Vec<serde_json::Value> {
        self.rows.into_iter().map(serde_json::Value::Object).collect()
    }
}

/// A failed statement as reported by the collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionFailure {
    pub message: String,
    /// SQLSTATE, when the failure came from the server
    pub code: Option<String>,
}

impl ExecutionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl From<sqlx::Error> for ExecutionFailure {
    fn from(error: sqlx::Error) -> Self {
        match error.as_database_error() {
            Some(db) => Self {
                message: db.message().to_string(),
                code: db.code().map(|code| code.into_owned()),
            },
            None => Self {
                message: error.to_string(),
                code: None,
            },
        }
    }
}

/// Executes SQL on behalf of the table service
///
/// Implementations own connection management. Statements use `:name`
/// placeholders which are resolved from the supplied [`NamedParams`].
#[async_trait]
pub trait SqlExecutor: Send + Sync + 'static {
    /// Run a read statement and return its rows
    async fn fetch(&self, sql: &str, params: &NamedParams) -> Result<ResultSet, ExecutionFailure>;

    /// Open a transaction for mutating statements
    async fn begin(&self) -> Result<Box<dyn SqlTransaction>, ExecutionFailure>;

    /// Quote a value as a SQL string literal, as PostgreSQL's `quote_literal` does
    async fn quote_literal(&self, value: &str) -> Result<String, ExecutionFailure>;
}

/// An open transaction. Dropping it without commit rolls back.
#[async_trait]
pub trait SqlTransaction: Send {
    /// Execute a statement, returning the number of affected rows
    async fn execute(&mut self, sql: &str, params: &NamedParams) -> Result<u64, ExecutionFailure>;

    async fn commit(self: Box<Self>) -> Result<(), ExecutionFailure>;

    async fn rollback(self: Box<Self>) -> Result<(), ExecutionFailure>;
}
