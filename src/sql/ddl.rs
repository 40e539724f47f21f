//! DDL generation for table and column management
//!
//! Builders expect inputs that already passed validation. Identifiers are
//! quoted here and nowhere else; type strings are emitted as given.

use crate::sql::sanitize::sanitize_identifier;
use crate::types::ColumnDefinition;

/// Generate a CREATE TABLE statement
///
/// Columns are emitted one per line. Primary-key columns are not marked
/// inline; they are collected in input order into a single trailing
/// `PRIMARY KEY (...)` constraint, so composite keys need no special casing.
pub fn build_create_table(table_name: &str, columns: &[ColumnDefinition]) -> String {
    let mut clauses: Vec<String> = columns.iter().map(format_column_definition).collect();

    let primary_key: Vec<String> = columns
        .iter()
        .filter(|c| c.is_primary)
        .map(|c| sanitize_identifier(&c.name))
        .collect();

    if !primary_key.is_empty() {
        clauses.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
    }

    format!(
        "CREATE TABLE {} (\n  {}\n)",
        sanitize_identifier(table_name),
        clauses.join(",\n  ")
    )
}

/// Generate a DROP TABLE statement
pub fn build_drop_table(table_name: &str, cascade: bool) -> String {
    format!(
        "DROP TABLE {}{}",
        sanitize_identifier(table_name),
        cascade_suffix(cascade)
    )
}

/// Generate an ALTER TABLE ... ADD COLUMN statement
///
/// The column's default value is not included: it has to be quoted by the
/// executor and appended by the caller.
pub fn build_add_column(table_name: &str, column: &ColumnDefinition) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        sanitize_identifier(table_name),
        format_column_definition(column)
    )
}

/// Generate an ALTER TABLE ... DROP COLUMN statement
pub fn build_drop_column(table_name: &str, column_name: &str, cascade: bool) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}{}",
        sanitize_identifier(table_name),
        sanitize_identifier(column_name),
        cascade_suffix(cascade)
    )
}

/// Format a single column clause: `"name" TYPE[ NOT NULL]`
pub fn format_column_definition(col: &ColumnDefinition) -> String {
    let mut clause = format!("{} {}", sanitize_identifier(&col.name), col.data_type.trim());

    if !col.nullable {
        clause.push_str(" NOT NULL");
    }

    clause
}

fn cascade_suffix(cascade: bool) -> &'static str {
    if cascade { " CASCADE" } else { "" }
}
