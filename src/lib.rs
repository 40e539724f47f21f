//! # pg-table-admin
//!
//! Web administration backend for PostgreSQL tables.
//!
//! Lists tables, describes their columns, pages through rows and runs
//! CREATE/DROP TABLE and ADD/DROP COLUMN on behalf of a browser client.
//! Every identifier is validated and quoted before it reaches SQL; values
//! travel as bind parameters or through `quote_literal`.
//!
//! ## Features
//!
//! - **Identifier validation**: PostgreSQL naming rules, reserved words, length limit
//! - **Type whitelist**: column types checked against a fixed set of base types
//! - **Race-safe DDL**: catalog checks first, SQLSTATE downgrades when another session wins
//! - **Pagination**: bounded page size with `has_more` bookkeeping
//! - **HTTP API**: axum router with JSON envelopes under `/api`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pg_table_admin::{AdminConfig, ColumnDefinition, CreateTableRequest, PgExecutor, TableService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AdminConfig::builder()
//!         .database_url("postgres://localhost/mydb")
//!         .build();
//!     let service = TableService::new(PgExecutor::connect(&config).await?);
//!
//!     let result = service
//!         .create_table(CreateTableRequest::new(
//!             "users",
//!             vec![
//!                 ColumnDefinition::new("id", "SERIAL").primary_key(),
//!                 ColumnDefinition::new("email", "VARCHAR(255)").not_null(),
//!             ],
//!         ))
//!         .await?;
//!     println!("{}", result.sql);
//!
//!     let page = service.get_table_data("users", 50, 0).await?;
//!     assert_eq!(page.total_rows, 0);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! The binary reads `DATABASE_URL` (or `DB_HOST`, `DB_PORT`, `DB_NAME`,
//! `DB_USER`, `DB_PASSWORD`), `DB_MAX_CONNECTIONS`, `BIND_ADDRESS`,
//! `APP_DEBUG` and `MAX_PAGE_SIZE`. See [`AdminConfig::from_env`].

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod service;
pub mod sql;
pub mod types;

// Re-export main types for convenience
pub use config::{AdminConfig, AdminConfigBuilder};
pub use error::{AdminError, ErrorKind, Result};
pub use executor::{ExecutionFailure, PgExecutor, ResultSet, SqlExecutor, SqlTransaction};
pub use http::{AppState, create_router};
pub use service::TableService;
pub use types::{
    ColumnDefinition, CreateTableRequest, OperationResult, PaginatedRows, TableColumn,
    TableSchema, TableSummary,
};

// Re-export SQL utilities for advanced users
pub use sql::params::NamedParams;
pub use sql::sanitize::{
    is_reserved_word, sanitize_identifier, validate_column, validate_data_type,
    validate_identifier,
};
