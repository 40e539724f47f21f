//! Introspection queries against `information_schema`
//!
//! Catalog lookups are fixed statements keyed by `:table_name` and
//! `:column_name`; names are never interpolated into them. Everything is
//! scoped to `current_schema()`, which is also where unqualified DDL lands.
//! Catalog domain types (`sql_identifier`, `cardinal_number`, ...) are cast
//! to plain `text`/`int` so they decode like ordinary columns.

use crate::sql::params::NamedParams;
use crate::sql::sanitize::sanitize_identifier;

/// Whether a base table exists. Binds `:table_name`; yields `table_exists`.
pub const TABLE_EXISTS: &str = r#"SELECT EXISTS (
    SELECT 1
    FROM information_schema.tables
    WHERE table_schema = current_schema()
      AND table_name = :table_name
      AND table_type = 'BASE TABLE'
) AS table_exists"#;

/// Whether a column exists. Binds `:table_name`, `:column_name`; yields `column_exists`.
pub const COLUMN_EXISTS: &str = r#"SELECT EXISTS (
    SELECT 1
    FROM information_schema.columns
    WHERE table_schema = current_schema()
      AND table_name = :table_name
      AND column_name = :column_name
) AS column_exists"#;

/// Number of columns of a table. Binds `:table_name`; yields `column_count`.
pub const COUNT_COLUMNS: &str = r#"SELECT COUNT(*) AS column_count
FROM information_schema.columns
WHERE table_schema = current_schema()
  AND table_name = :table_name"#;

/// Column descriptors in ordinal order. Binds `:table_name`.
pub const TABLE_COLUMNS: &str = r#"SELECT
    c.column_name::text AS column_name,
    (CASE
        WHEN c.character_maximum_length IS NOT NULL
            THEN c.data_type || '(' || c.character_maximum_length || ')'
        WHEN c.data_type = 'numeric' AND c.numeric_precision IS NOT NULL
            THEN c.data_type || '(' || c.numeric_precision || ',' || c.numeric_scale || ')'
        ELSE c.data_type
    END)::text AS data_type,
    (c.is_nullable = 'YES') AS nullable,
    c.column_default::text AS column_default,
    c.ordinal_position::int AS ordinal_position
FROM information_schema.columns c
WHERE c.table_schema = current_schema()
  AND c.table_name = :table_name
ORDER BY c.ordinal_position"#;

/// Primary-key columns in key order. Binds `:table_name`; yields `column_name`.
pub const PRIMARY_KEY_COLUMNS: &str = r#"SELECT kcu.column_name::text AS column_name
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON tc.constraint_name = kcu.constraint_name
 AND tc.table_schema = kcu.table_schema
 AND tc.table_name = kcu.table_name
WHERE tc.table_schema = current_schema()
  AND tc.table_name = :table_name
  AND tc.constraint_type = 'PRIMARY KEY'
ORDER BY kcu.ordinal_position"#;

/// All base tables with their column counts, by name
pub const LIST_TABLES: &str = r#"SELECT
    t.table_name::text AS table_name,
    COUNT(c.column_name) AS column_count
FROM information_schema.tables t
LEFT JOIN information_schema.columns c
  ON c.table_schema = t.table_schema
 AND c.table_name = t.table_name
WHERE t.table_schema = current_schema()
  AND t.table_type = 'BASE TABLE'
GROUP BY t.table_name
ORDER BY t.table_name"#;

/// Parameters for the table-keyed catalog queries
pub fn table_params(table_name: &str) -> NamedParams {
    NamedParams::new().with("table_name", table_name)
}

/// Parameters for the column-keyed catalog queries
pub fn column_params(table_name: &str, column_name: &str) -> NamedParams {
    table_params(table_name).with("column_name", column_name)
}

/// One page of rows. Binds `:limit` and `:offset`.
///
/// Ordering by the first column only gives pagination a stable order within
/// a single statement; no further ordering is promised.
pub fn build_paginated_select(table_name: &str) -> String {
    format!(
        "SELECT * FROM {} ORDER BY 1 LIMIT :limit OFFSET :offset",
        sanitize_identifier(table_name)
    )
}

/// Total row count, yielded as `total`
pub fn build_row_count(table_name: &str) -> String {
    format!("SELECT COUNT(*) AS total FROM {}", sanitize_identifier(table_name))
}

/// Parameters for [`build_paginated_select`]
pub fn page_params(limit: i64, offset: i64) -> NamedParams {
    NamedParams::new().with("limit", limit).with("offset", offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::params::{SqlValue, compile_named};

    #[test]
    fn test_build_paginated_select() {
        assert_eq!(
            build_paginated_select("users"),
            "SELECT * FROM \"users\" ORDER BY 1 LIMIT :limit OFFSET :offset"
        );
    }

    #[test]
    fn test_build_row_count() {
        assert_eq!(
            build_row_count("users"),
            "SELECT COUNT(*) AS total FROM \"users\""
        );
    }

    #[test]
    fn test_catalog_queries_are_parameterized() {
        for sql in [TABLE_EXISTS, COUNT_COLUMNS, TABLE_COLUMNS, PRIMARY_KEY_COLUMNS] {
            let compiled = compile_named(sql);
            assert_eq!(compiled.names, vec!["table_name"], "{sql}");
        }

        let compiled = compile_named(COLUMN_EXISTS);
        assert_eq!(compiled.names, vec!["table_name", "column_name"]);

        assert!(compile_named(LIST_TABLES).names.is_empty());
    }

    #[test]
    fn test_casts_survive_compilation() {
        let compiled = compile_named(TABLE_COLUMNS);
        assert!(compiled.sql.contains("c.ordinal_position::int AS ordinal_position"));
        assert!(compiled.sql.contains("AND c.table_name = $1"));
        assert!(!compiled.sql.contains(":table_name"));
    }

    #[test]
    fn test_param_helpers() {
        let params = column_params("users", "email");
        assert_eq!(params.get("table_name"), Some(&SqlValue::Text("users".into())));
        assert_eq!(params.get("column_name"), Some(&SqlValue::Text("email".into())));

        let page = page_params(25, 50);
        assert_eq!(page.get("limit"), Some(&SqlValue::Int(25)));
        assert_eq!(page.get("offset"), Some(&SqlValue::Int(50)));
    }
}
