//! TableService - orchestration of table and column administration
//!
//! Every operation validates its input, checks the live catalog, builds SQL
//! and hands it to the injected [`SqlExecutor`]. Mutating statements run in a
//! transaction; reads run as single statements.

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_MAX_PAGE_SIZE;
use crate::error::{AdminError, Result};
use crate::executor::{ExecutionFailure, ResultSet, SqlExecutor, sqlstate};
use crate::sql::catalog::{self, column_params, page_params, table_params};
use crate::sql::ddl::{build_add_column, build_create_table, build_drop_column, build_drop_table};
use crate::sql::params::NamedParams;
use crate::sql::sanitize::{identifier_errors, validate_column, validate_column_set};
use crate::types::{
    ColumnDefinition, CreateTableRequest, OperationResult, PaginatedRows, TableColumn,
    TableSchema, TableSummary,
};

/// Table administration service
///
/// Holds no state besides its executor; share it behind an `Arc`.
pub struct TableService<E: SqlExecutor> {
    executor: E,
    max_page_size: i64,
}

impl<E: SqlExecutor> TableService<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Set the largest accepted page size for [`Self::get_table_data`]
    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn max_page_size(&self) -> i64 {
        self.max_page_size
    }

    /// Round-trip a trivial query to confirm the database is reachable
    pub async fn ping(&self) -> Result<()> {
        self.read("SELECT 1 AS ok", &NamedParams::new()).await?;
        Ok(())
    }

    // =========================================================================
    // Catalog Lookups
    // =========================================================================

    /// List base tables of the current schema
    pub async fn list_tables(&self) -> Result<Vec<TableSummary>> {
        let result = self.read(catalog::LIST_TABLES, &NamedParams::new()).await?;

        result
            .rows
            .iter()
            .map(|row| {
                Ok(TableSummary {
                    table_name: text(row, "table_name")?,
                    column_count: int(row, "column_count")?,
                })
            })
            .collect()
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let result = self
            .read(catalog::TABLE_EXISTS, &table_params(table_name))
            .await?;
        first_flag(&result, "table_exists")
    }

    pub async fn column_exists(&self, table_name: &str, column_name: &str) -> Result<bool> {
        let result = self
            .read(catalog::COLUMN_EXISTS, &column_params(table_name, column_name))
            .await?;
        first_flag(&result, "column_exists")
    }

    pub async fn column_count(&self, table_name: &str) -> Result<i64> {
        let result = self
            .read(catalog::COUNT_COLUMNS, &table_params(table_name))
            .await?;
        let row = result
            .first()
            .ok_or_else(|| unexpected_row("column_count"))?;
        int(row, "column_count")
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Create a table
    ///
    /// Fails with `Conflict` when the table already exists, including when a
    /// concurrent request created it after the existence check.
    pub async fn create_table(&self, request: CreateTableRequest) -> Result<OperationResult> {
        let CreateTableRequest {
            table_name,
            columns,
        } = request;

        let mut errors = identifier_errors(&table_name, "Table name");
        errors.extend(validate_column_set(&columns).errors);
        if !errors.is_empty() {
            return Err(AdminError::validation_errors(errors));
        }

        if self.table_exists(&table_name).await? {
            return Err(AdminError::conflict(format!(
                "Table '{}' already exists",
                table_name
            )));
        }

        let sql = build_create_table(&table_name, &columns);
        self.execute_ddl(&sql, &table_params(&table_name)).await?;

        info!(table = %table_name, columns = columns.len(), sql = %sql, "Created table");

        Ok(OperationResult {
            table_name,
            sql,
            affected_columns: Some(columns.into_iter().map(|c| c.name).collect()),
        })
    }

    /// Drop a table, optionally with CASCADE
    pub async fn drop_table(&self, table_name: &str, cascade: bool) -> Result<OperationResult> {
        validate_table_name(table_name)?;
        self.require_table(table_name).await?;

        let sql = build_drop_table(table_name, cascade);
        self.execute_ddl(&sql, &table_params(table_name)).await?;

        info!(table = %table_name, cascade, sql = %sql, "Dropped table");

        Ok(OperationResult {
            table_name: table_name.to_string(),
            sql,
            affected_columns: None,
        })
    }

    // =========================================================================
    // Column Operations
    // =========================================================================

    /// Add a column to an existing table
    ///
    /// A default value is quoted by the executor and appended as
    /// `DEFAULT <literal>`.
    pub async fn add_column(
        &self,
        table_name: &str,
        column: ColumnDefinition,
    ) -> Result<OperationResult> {
        let mut errors = identifier_errors(table_name, "Table name");
        errors.extend(validate_column(&column).errors);
        if column.is_primary {
            errors.push(format!(
                "Column '{}' cannot be added as a primary key column",
                column.name
            ));
        }
        if !errors.is_empty() {
            return Err(AdminError::validation_errors(errors));
        }

        self.require_table(table_name).await?;

        if self.column_exists(table_name, &column.name).await? {
            return Err(AdminError::conflict(format!(
                "Column '{}' already exists in table '{}'",
                column.name, table_name
            )));
        }

        let mut sql = build_add_column(table_name, &column);
        if let Some(default) = &column.default {
            let quoted = self
                .executor
                .quote_literal(default)
                .await
                .map_err(|failure| {
                    self.translate_failure(failure, "quote_literal", &NamedParams::new())
                })?;
            sql.push_str(" DEFAULT ");
            sql.push_str(&quoted);
        }

        self.execute_ddl(&sql, &column_params(table_name, &column.name))
            .await?;

        info!(table = %table_name, column = %column.name, sql = %sql, "Added column");

        Ok(OperationResult {
            table_name: table_name.to_string(),
            sql,
            affected_columns: Some(vec![column.name]),
        })
    }

    /// Drop a column, refusing to remove the last one of a table
    pub async fn drop_column(
        &self,
        table_name: &str,
        column_name: &str,
        cascade: bool,
    ) -> Result<OperationResult> {
        let mut errors = identifier_errors(table_name, "Table name");
        errors.extend(identifier_errors(column_name, "Column name"));
        if !errors.is_empty() {
            return Err(AdminError::validation_errors(errors));
        }

        self.require_table(table_name).await?;

        if !self.column_exists(table_name, column_name).await? {
            return Err(AdminError::not_found(format!(
                "Column '{}' does not exist in table '{}'",
                column_name, table_name
            )));
        }

        if self.column_count(table_name).await? <= 1 {
            warn!(table = %table_name, column = %column_name, "Refused to drop last column");
            return Err(AdminError::validation(format!(
                "Cannot drop column '{}': it is the last column of table '{}'",
                column_name, table_name
            )));
        }

        let sql = build_drop_column(table_name, column_name, cascade);
        self.execute_ddl(&sql, &column_params(table_name, column_name))
            .await?;

        info!(table = %table_name, column = %column_name, cascade, sql = %sql, "Dropped column");

        Ok(OperationResult {
            table_name: table_name.to_string(),
            sql,
            affected_columns: Some(vec![column_name.to_string()]),
        })
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Describe a table: columns in ordinal order, primary-key flags and row count
    pub async fn get_table_schema(&self, table_name: &str) -> Result<TableSchema> {
        validate_table_name(table_name)?;
        self.require_table(table_name).await?;

        let params = table_params(table_name);
        let column_rows = self.read(catalog::TABLE_COLUMNS, &params).await?;
        let pk_rows = self.read(catalog::PRIMARY_KEY_COLUMNS, &params).await?;

        let primary_key = pk_rows
            .rows
            .iter()
            .map(|row| text(row, "column_name"))
            .collect::<Result<Vec<_>>>()?;

        let columns = column_rows
            .rows
            .iter()
            .map(|row| {
                let column_name = text(row, "column_name")?;
                Ok(TableColumn {
                    is_primary_key: primary_key.contains(&column_name),
                    column_name,
                    data_type: text(row, "data_type")?,
                    nullable: flag(row, "nullable")?,
                    default: optional_text(row, "column_default"),
                    ordinal_position: int(row, "ordinal_position")? as i32,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let row_count = self.row_count(table_name).await?;

        debug!(table = %table_name, columns = columns.len(), row_count, "Loaded table schema");

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
            row_count,
        })
    }

    /// Fetch one page of rows
    ///
    /// Columns, count and rows are three separate reads; a schema change in
    /// between shows up as a slightly inconsistent page, not as an error.
    pub async fn get_table_data(
        &self,
        table_name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<PaginatedRows> {
        let mut errors = identifier_errors(table_name, "Table name");
        if limit < 1 || limit > self.max_page_size {
            errors.push(format!(
                "Limit must be between 1 and {}",
                self.max_page_size
            ));
        }
        if offset < 0 {
            errors.push("Offset cannot be negative".to_string());
        }
        if !errors.is_empty() {
            return Err(AdminError::validation_errors(errors));
        }

        self.require_table(table_name).await?;

        let column_rows = self
            .read(catalog::TABLE_COLUMNS, &table_params(table_name))
            .await?;
        let columns = column_rows
            .rows
            .iter()
            .map(|row| text(row, "column_name"))
            .collect::<Result<Vec<_>>>()?;

        let total_rows = self.row_count(table_name).await?;

        let rows = self
            .read(
                &catalog::build_paginated_select(table_name),
                &page_params(limit, offset),
            )
            .await?
            .into_values();

        debug!(table = %table_name, limit, offset, total_rows, "Loaded table data");

        Ok(PaginatedRows::new(columns, rows, total_rows, limit, offset))
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn require_table(&self, table_name: &str) -> Result<()> {
        if self.table_exists(table_name).await? {
            Ok(())
        } else {
            Err(AdminError::not_found(format!(
                "Table '{}' does not exist",
                table_name
            )))
        }
    }

    async fn row_count(&self, table_name: &str) -> Result<i64> {
        let result = self
            .read(&catalog::build_row_count(table_name), &NamedParams::new())
            .await?;
        let row = result.first().ok_or_else(|| unexpected_row("total"))?;
        int(row, "total")
    }

    async fn read(&self, sql: &str, params: &NamedParams) -> Result<ResultSet> {
        self.executor
            .fetch(sql, params)
            .await
            .map_err(|failure| self.translate_failure(failure, sql, params))
    }

    /// Run one statement in its own transaction, rolling back on failure
    async fn execute_ddl(&self, sql: &str, context: &NamedParams) -> Result<()> {
        self.run_in_transaction(sql)
            .await
            .map_err(|failure| self.translate_failure(failure, sql, context))
    }

    async fn run_in_transaction(&self, sql: &str) -> std::result::Result<(), ExecutionFailure> {
        let mut tx = self.executor.begin().await?;

        match tx.execute(sql, &NamedParams::new()).await {
            Ok(_) => tx.commit().await,
            Err(failure) => {
                if let Err(rollback_failure) = tx.rollback().await {
                    warn!(error = %rollback_failure, "Rollback failed");
                }
                Err(failure)
            }
        }
    }

    /// Map a collaborator failure onto the error taxonomy
    ///
    /// Duplicate/undefined object errors mean the catalog changed between the
    /// existence check and the statement; they surface as Conflict/NotFound.
    fn translate_failure(
        &self,
        failure: ExecutionFailure,
        sql: &str,
        params: &NamedParams,
    ) -> AdminError {
        match failure.code.as_deref() {
            Some(sqlstate::DUPLICATE_TABLE) | Some(sqlstate::DUPLICATE_COLUMN) => {
                warn!(sql = %sql, error = %failure, "Object was created concurrently");
                AdminError::conflict(failure.message)
            }
            Some(sqlstate::UNDEFINED_TABLE) | Some(sqlstate::UNDEFINED_COLUMN) => {
                warn!(sql = %sql, error = %failure, "Object disappeared concurrently");
                AdminError::not_found(failure.message)
            }
            _ => {
                error!(
                    sql = %sql,
                    code = ?failure.code,
                    error = %failure,
                    "Statement failed"
                );
                AdminError::database(failure, sql, Some(params.redacted()))
            }
        }
    }
}

fn validate_table_name(table_name: &str) -> Result<()> {
    let errors = identifier_errors(table_name, "Table name");
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AdminError::validation_errors(errors))
    }
}

fn unexpected_row(field: &str) -> AdminError {
    AdminError::from(ExecutionFailure::new(format!(
        "Unexpected catalog result: missing or invalid '{}'",
        field
    )))
}

fn first_flag(result: &ResultSet, field: &str) -> Result<bool> {
    let row = result.first().ok_or_else(|| unexpected_row(field))?;
    flag(row, field)
}

fn text(row: &Map<String, Value>, field: &str) -> Result<String> {
    row.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| unexpected_row(field))
}

fn optional_text(row: &Map<String, Value>, field: &str) -> Option<String> {
    row.get(field).and_then(Value::as_str).map(str::to_string)
}

fn int(row: &Map<String, Value>, field: &str) -> Result<i64> {
    row.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| unexpected_row(field))
}

fn flag(row: &Map<String, Value>, field: &str) -> Result<bool> {
    row.get(field)
        .and_then(Value::as_bool)
        .ok_or_else(|| unexpected_row(field))
}
