//! PostgreSQL executor backed by a sqlx connection pool

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo};

use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use crate::executor::{ExecutionFailure, ResultSet, SqlExecutor, SqlTransaction};
use crate::sql::params::{NamedParams, SqlValue, compile_named};

const QUOTE_LITERAL: &str = "SELECT quote_literal(:value::text) AS quoted";

/// Executor running statements on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the connection settings from `config`
    pub async fn connect(config: &AdminConfig) -> Result<Self> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                AdminError::configuration(format!("Database connection failed: {}", e))
            })?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn fetch(
        &self,
        sql: &str,
        params: &NamedParams,
    ) -> std::result::Result<ResultSet, ExecutionFailure> {
        let compiled = compile_named(sql);
        let values = compiled.resolve(params).map_err(ExecutionFailure::new)?;

        let rows = bind_values(sqlx::query(&compiled.sql), values)
            .fetch_all(&self.pool)
            .await?;

        rows_to_result_set(&rows)
    }

    async fn begin(&self) -> std::result::Result<Box<dyn SqlTransaction>, ExecutionFailure> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn quote_literal(&self, value: &str) -> std::result::Result<String, ExecutionFailure> {
        let result = self
            .fetch(QUOTE_LITERAL, &NamedParams::new().with("value", value))
            .await?;

        result
            .first()
            .and_then(|row| row.get("quoted"))
            .and_then(|quoted| quoted.as_str())
            .map(str::to_string)
            .ok_or_else(|| ExecutionFailure::new("quote_literal returned no value"))
    }
}

/// Transaction on a pooled connection; sqlx rolls back on drop
struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl SqlTransaction for PgTransaction {
    async fn execute(
        &mut self,
        sql: &str,
        params: &NamedParams,
    ) -> std::result::Result<u64, ExecutionFailure> {
        let compiled = compile_named(sql);
        let values = compiled.resolve(params).map_err(ExecutionFailure::new)?;

        let result = bind_values(sqlx::query(&compiled.sql), values)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> std::result::Result<(), ExecutionFailure> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> std::result::Result<(), ExecutionFailure> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: Vec<&'q SqlValue>,
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

fn rows_to_result_set(rows: &[PgRow]) -> std::result::Result<ResultSet, ExecutionFailure> {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(row_to_json)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ResultSet::new(columns, rows))
}

/// Decode a row into a JSON object keyed by column name
///
/// Types without a lossless JSON form (numeric, temporal, uuid) are rendered
/// as strings. Values that cannot be decoded become `null`.
fn row_to_json(
    row: &PgRow,
) -> std::result::Result<serde_json::Map<String, serde_json::Value>, ExecutionFailure> {
    use serde_json::Value;

    let mut map = serde_json::Map::new();

    for column in row.columns() {
        let index = column.ordinal();
        let type_name = column.type_info().name();

        let value = match type_name {
            "BOOL" => row
                .try_get::<Option<bool>, _>(index)?
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            "INT2" => row
                .try_get::<Option<i16>, _>(index)?
                .map(|v| Value::Number(v.into()))
                .unwrap_or(Value::Null),
            "INT4" => row
                .try_get::<Option<i32>, _>(index)?
                .map(|v| Value::Number(v.into()))
                .unwrap_or(Value::Null),
            "INT8" => row
                .try_get::<Option<i64>, _>(index)?
                .map(|v| Value::Number(v.into()))
                .unwrap_or(Value::Null),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(index)?
                .and_then(|v| serde_json::Number::from_f64(v as f64))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(index)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            "NUMERIC" => row
                .try_get::<Option<rust_decimal::Decimal>, _>(index)
                .ok()
                .flatten()
                .map(|d| Value::String(d.to_string()))
                .unwrap_or(Value::Null),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => row
                .try_get::<Option<String>, _>(index)?
                .map(Value::String)
                .unwrap_or(Value::Null),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(index)?
                .map(|d| Value::String(d.to_string()))
                .unwrap_or(Value::Null),
            "TIME" => row
                .try_get::<Option<chrono::NaiveTime>, _>(index)?
                .map(|t| Value::String(t.to_string()))
                .unwrap_or(Value::Null),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
                .map(|ts| Value::String(ts.to_string()))
                .unwrap_or(Value::Null),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
                .map(|ts| Value::String(ts.to_rfc3339()))
                .unwrap_or(Value::Null),
            "JSON" | "JSONB" => row
                .try_get::<Option<Value>, _>(index)?
                .unwrap_or(Value::Null),
            "UUID" => row
                .try_get::<Option<uuid::Uuid>, _>(index)?
                .map(|u| Value::String(u.to_string()))
                .unwrap_or(Value::Null),
            "BYTEA" => row
                .try_get::<Option<Vec<u8>>, _>(index)?
                .map(|bytes| Value::String(format!("[BLOB: {} bytes]", bytes.len())))
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<Option<String>, _>(index)
                .ok()
                .flatten()
                .map(Value::String)
                .unwrap_or(Value::Null),
        };

        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}
