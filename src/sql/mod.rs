//! SQL utilities
//!
//! Provides identifier validation, DDL generation, catalog queries and named
//! parameter handling.

pub mod catalog;
pub mod ddl;
pub mod params;
pub mod sanitize;

pub use ddl::{build_add_column, build_create_table, build_drop_column, build_drop_table};
pub use params::{CompiledSql, NamedParams, SqlValue, compile_named};
pub use sanitize::{
    POSTGRES_RESERVED_WORDS, SUPPORTED_DATA_TYPES, ValidationReport, sanitize_identifier,
    validate_column, validate_column_set, validate_data_type, validate_identifier,
};
