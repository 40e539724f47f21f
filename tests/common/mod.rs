//! In-memory `SqlExecutor` used by the service and HTTP tests
//!
//! Answers the catalog queries from a table map, records every committed
//! statement and can be told to fail the next statement with a SQLSTATE.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pg_table_admin::executor::ExecutionFailure;
use pg_table_admin::sql::catalog;
use pg_table_admin::sql::params::SqlValue;
use pg_table_admin::{NamedParams, ResultSet, SqlExecutor, SqlTransaction};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone)]
pub struct FakeColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary: bool,
}

impl FakeColumn {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            default: None,
            primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub columns: Vec<FakeColumn>,
    pub rows: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub tables: BTreeMap<String, FakeTable>,
    /// Statements of committed transactions, in order
    pub committed: Vec<String>,
    pub rollbacks: usize,
    /// Every SQL string passed to `fetch`
    pub reads: Vec<String>,
    /// Fails the next transactional statement
    pub fail_next_execute: Option<ExecutionFailure>,
    /// Fails every read whose SQL starts with the given prefix
    pub fail_reads_starting_with: Option<(String, ExecutionFailure)>,
}

#[derive(Clone, Default)]
pub struct FakeExecutor {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, columns: Vec<FakeColumn>) -> Self {
        self.state.lock().unwrap().tables.insert(
            name.to_string(),
            FakeTable {
                columns,
                rows: Vec::new(),
            },
        );
        self
    }

    pub fn with_rows(self, name: &str, rows: Vec<Value>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .get_mut(name)
            .expect("table registered before rows")
            .rows = rows;
        self
    }

    pub fn fail_next_execute(&self, message: &str, code: &str) {
        self.state.lock().unwrap().fail_next_execute =
            Some(ExecutionFailure::new(message).with_code(code));
    }

    pub fn fail_reads_starting_with(&self, prefix: &str, failure: ExecutionFailure) {
        self.state.lock().unwrap().fail_reads_starting_with = Some((prefix.to_string(), failure));
    }

    pub fn committed(&self) -> Vec<String> {
        self.state.lock().unwrap().committed.clone()
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }

    pub fn reads(&self) -> Vec<String> {
        self.state.lock().unwrap().reads.clone()
    }
}

fn text_param(params: &NamedParams, name: &str) -> String {
    match params.get(name) {
        Some(SqlValue::Text(s)) => s.clone(),
        other => panic!("expected text parameter :{name}, got {other:?}"),
    }
}

fn int_param(params: &NamedParams, name: &str) -> i64 {
    match params.get(name) {
        Some(SqlValue::Int(i)) => *i,
        other => panic!("expected int parameter :{name}, got {other:?}"),
    }
}

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Table name from `... FROM "name"...`
fn quoted_table(sql: &str) -> String {
    let start = sql.find("FROM \"").expect("FROM clause") + 6;
    let end = sql[start..].find('"').expect("closing quote") + start;
    sql[start..end].to_string()
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    async fn fetch(&self, sql: &str, params: &NamedParams) -> Result<ResultSet, ExecutionFailure> {
        let mut state = self.state.lock().unwrap();
        state.reads.push(sql.to_string());

        if let Some((prefix, failure)) = &state.fail_reads_starting_with {
            if sql.starts_with(prefix.as_str()) {
                return Err(failure.clone());
            }
        }

        let rows = if sql == catalog::TABLE_EXISTS {
            let exists = state.tables.contains_key(&text_param(params, "table_name"));
            vec![row(json!({ "table_exists": exists }))]
        } else if sql == catalog::COLUMN_EXISTS {
            let table = text_param(params, "table_name");
            let column = text_param(params, "column_name");
            let exists = state
                .tables
                .get(&table)
                .is_some_and(|t| t.columns.iter().any(|c| c.name == column));
            vec![row(json!({ "column_exists": exists }))]
        } else if sql == catalog::COUNT_COLUMNS {
            let count = state
                .tables
                .get(&text_param(params, "table_name"))
                .map_or(0, |t| t.columns.len());
            vec![row(json!({ "column_count": count }))]
        } else if sql == catalog::TABLE_COLUMNS {
            let table = text_param(params, "table_name");
            state
                .tables
                .get(&table)
                .map(|t| {
                    t.columns
                        .iter()
                        .enumerate()
                        .map(|(i, c)| {
                            row(json!({
                                "column_name": c.name,
                                "data_type": c.data_type,
                                "nullable": c.nullable,
                                "column_default": c.default,
                                "ordinal_position": i + 1,
                            }))
                        })
                        .collect()
                })
                .unwrap_or_default()
        } else if sql == catalog::PRIMARY_KEY_COLUMNS {
            let table = text_param(params, "table_name");
            state
                .tables
                .get(&table)
                .map(|t| {
                    t.columns
                        .iter()
                        .filter(|c| c.primary)
                        .map(|c| row(json!({ "column_name": c.name })))
                        .collect()
                })
                .unwrap_or_default()
        } else if sql == catalog::LIST_TABLES {
            state
                .tables
                .iter()
                .map(|(name, t)| row(json!({ "table_name": name, "column_count": t.columns.len() })))
                .collect()
        } else if sql == "SELECT 1 AS ok" {
            vec![row(json!({ "ok": 1 }))]
        } else if sql.starts_with("SELECT COUNT(*) AS total FROM ") {
            let table = quoted_table(sql);
            let Some(t) = state.tables.get(&table) else {
                return Err(ExecutionFailure::new(format!(
                    "relation \"{table}\" does not exist"
                ))
                .with_code("42P01"));
            };
            vec![row(json!({ "total": t.rows.len() }))]
        } else if sql.starts_with("SELECT * FROM ") {
            let table = quoted_table(sql);
            let limit = int_param(params, "limit") as usize;
            let offset = int_param(params, "offset") as usize;
            let t = state.tables.get(&table).cloned().unwrap_or_default();
            t.rows
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(row)
                .collect()
        } else {
            return Err(ExecutionFailure::new(format!("unexpected query: {sql}")));
        };

        let columns = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Ok(ResultSet::new(columns, rows))
    }

    async fn begin(&self) -> Result<Box<dyn SqlTransaction>, ExecutionFailure> {
        Ok(Box::new(FakeTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }

    async fn quote_literal(&self, value: &str) -> Result<String, ExecutionFailure> {
        Ok(format!("'{}'", value.replace('\'', "''")))
    }
}

struct FakeTransaction {
    state: Arc<Mutex<FakeState>>,
    pending: Vec<String>,
}

#[async_trait]
impl SqlTransaction for FakeTransaction {
    async fn execute(&mut self, sql: &str, _params: &NamedParams) -> Result<u64, ExecutionFailure> {
        if let Some(failure) = self.state.lock().unwrap().fail_next_execute.take() {
            return Err(failure);
        }
        self.pending.push(sql.to_string());
        Ok(0)
    }

    async fn commit(self: Box<Self>) -> Result<(), ExecutionFailure> {
        let FakeTransaction { state, pending } = *self;
        state.lock().unwrap().committed.extend(pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), ExecutionFailure> {
        self.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
