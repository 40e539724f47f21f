//! Core type definitions
//!
//! Includes column definitions supplied by callers and the read-only views
//! assembled from the live catalog.

use serde::{Deserialize, Serialize};

fn default_nullable() -> bool {
    true
}

/// Column definition supplied when creating a table or adding a column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDefinition {
    /// Column name (must be a valid PostgreSQL identifier)
    pub name: String,

    /// Raw PostgreSQL type, e.g. `VARCHAR(255)` or `DOUBLE PRECISION`
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Whether the column is part of the primary key (default: false)
    #[serde(default, rename = "isPrimary")]
    pub is_primary: bool,

    /// Default value, only honoured when adding a column. Quoted as a literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDefinition {
    /// Create a nullable, non-key column
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_primary: false,
            default: None,
        }
    }

    /// Set the column as non-nullable
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column as (part of) the primary key
    pub fn primary_key(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Set a default value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Request body for creating a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTableRequest {
    #[serde(rename = "tableName")]
    pub table_name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl CreateTableRequest {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }
}

/// One column as reported by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableColumn {
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub ordinal_position: i32,
    pub is_primary_key: bool,
}

/// Live view of a table's structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    /// Columns in ordinal order
    pub columns: Vec<TableColumn>,
    pub row_count: i64,
}

impl TableSchema {
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.column_name.as_str())
            .collect()
    }
}

/// Entry of the table listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSummary {
    pub table_name: String,
    pub column_count: i64,
}

/// One page of table rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedRows {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Value>,
    pub total_rows: i64,
    pub page: i64,
    pub per_page: i64,
    pub has_more: bool,
}

impl PaginatedRows {
    /// Assemble a page, deriving `page` and `has_more` from `limit`/`offset`
    ///
    /// `limit` must be positive.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<serde_json::Value>,
        total_rows: i64,
        limit: i64,
        offset: i64,
    ) -> Self {
        Self {
            columns,
            rows,
            total_rows,
            page: (offset / limit).saturating_add(1),
            per_page: limit,
            has_more: offset.saturating_add(limit) < total_rows,
        }
    }
}

/// Result of a mutating operation, echoing the executed SQL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(rename = "tableName")]
    pub table_name: String,
    pub sql: String,
    #[serde(rename = "affectedColumns", skip_serializing_if = "Option::is_none")]
    pub affected_columns: Option<Vec<String>>,
}
