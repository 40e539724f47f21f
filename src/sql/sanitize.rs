//! Identifier and data type validation
//!
//! Every user-supplied table name, column name and type string passes through
//! this module before it is allowed anywhere near SQL text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{AdminError, Result};
use crate::types::ColumnDefinition;

/// PostgreSQL identifiers are truncated beyond this many bytes (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// PostgreSQL reserved keywords, including those only allowed as function or type names
pub const POSTGRES_RESERVED_WORDS: &[&str] = &[
    "ALL",
    "ANALYSE",
    "ANALYZE",
    "AND",
    "ANY",
    "ARRAY",
    "AS",
    "ASC",
    "ASYMMETRIC",
    "AUTHORIZATION",
    "BINARY",
    "BOTH",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLLATION",
    "COLUMN",
    "CONCURRENTLY",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_CATALOG",
    "CURRENT_DATE",
    "CURRENT_ROLE",
    "CURRENT_SCHEMA",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DEFERRABLE",
    "DESC",
    "DISTINCT",
    "DO",
    "ELSE",
    "END",
    "EXCEPT",
    "FALSE",
    "FETCH",
    "FOR",
    "FOREIGN",
    "FREEZE",
    "FROM",
    "FULL",
    "GRANT",
    "GROUP",
    "HAVING",
    "ILIKE",
    "IN",
    "INITIALLY",
    "INNER",
    "INTERSECT",
    "INTO",
    "IS",
    "ISNULL",
    "JOIN",
    "LATERAL",
    "LEADING",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NATURAL",
    "NOT",
    "NOTNULL",
    "NULL",
    "OFFSET",
    "ON",
    "ONLY",
    "OR",
    "ORDER",
    "OUTER",
    "OVERLAPS",
    "PLACING",
    "PRIMARY",
    "REFERENCES",
    "RETURNING",
    "RIGHT",
    "SELECT",
    "SESSION_USER",
    "SIMILAR",
    "SOME",
    "SYMMETRIC",
    "SYSTEM_USER",
    "TABLE",
    "TABLESAMPLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "USER",
    "USING",
    "VARIADIC",
    "VERBOSE",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
];

/// Base types accepted for column definitions
pub const SUPPORTED_DATA_TYPES: &[&str] = &[
    "SERIAL",
    "INTEGER",
    "BIGINT",
    "SMALLINT",
    "VARCHAR",
    "TEXT",
    "CHAR",
    "BOOLEAN",
    "DATE",
    "TIMESTAMP",
    "TIME",
    "DECIMAL",
    "NUMERIC",
    "REAL",
    "DOUBLE PRECISION",
    "JSON",
    "JSONB",
    "UUID",
];

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

static PARENTHESIZED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthesized group pattern"));

// Type strings are emitted verbatim, so nothing that could end the statement
// or open a literal/comment may appear in them.
static DATA_TYPE_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_ ,()\[\]]+$").expect("data type charset pattern"));

/// Outcome of a validation check, accumulating every violation found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Convert into a `Result`, failing with every collected violation
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(AdminError::validation_errors(self.errors))
        }
    }
}

/// Quote an identifier for interpolation into SQL text
///
/// Wraps the name in double quotes and doubles any embedded double quote.
/// This is the only way user-controlled names enter generated SQL.
///
/// # Example
/// ```
/// use pg_table_admin::sql::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("users"), "\"users\"");
/// assert_eq!(sanitize_identifier("a\"b"), "\"a\"\"b\"");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate a table or column name
///
/// Rules:
/// - Must not be empty or whitespace only (reported alone)
/// - At most 63 bytes
/// - Must start with a letter or underscore, followed by letters, digits or underscores
/// - Cannot be a PostgreSQL reserved word (case-insensitive)
///
/// # Example
/// ```
/// use pg_table_admin::sql::validate_identifier;
///
/// assert!(validate_identifier("order_items").valid);
/// assert!(!validate_identifier("select").valid);
/// ```
pub fn validate_identifier(name: &str) -> ValidationReport {
    ValidationReport::from_errors(identifier_errors(name, "Identifier"))
}

/// Same checks as [`validate_identifier`], with messages prefixed by `label`
pub(crate) fn identifier_errors(name: &str, label: &str) -> Vec<String> {
    if name.trim().is_empty() {
        return vec![format!("{} cannot be empty", label)];
    }

    let mut errors = Vec::new();

    if name.len() > MAX_IDENTIFIER_LENGTH {
        errors.push(format!(
            "{} '{}' exceeds the maximum length of {} bytes",
            label, name, MAX_IDENTIFIER_LENGTH
        ));
    }

    if !IDENTIFIER_PATTERN.is_match(name) {
        errors.push(format!(
            "{} '{}' is invalid. Must start with a letter or underscore and contain only letters, numbers, and underscores.",
            label, name
        ));
    }

    if is_reserved_word(name) {
        errors.push(format!(
            "{} '{}' is a PostgreSQL reserved keyword and cannot be used.",
            label, name
        ));
    }

    errors
}

pub fn is_reserved_word(name: &str) -> bool {
    POSTGRES_RESERVED_WORDS.contains(&name.to_uppercase().as_str())
}

/// Modifiers allowed after a base type, with the base types they apply to
const TYPE_MODIFIERS: &[(&str, &[&str])] = &[
    ("WITH TIME ZONE", &["TIME", "TIMESTAMP"]),
    ("WITHOUT TIME ZONE", &["TIME", "TIMESTAMP"]),
    ("VARYING", &["CHAR"]),
];

/// Validate a column data type string such as `VARCHAR(255)` or `DOUBLE PRECISION`
///
/// The first parenthesized group is removed. What remains, upper-cased and
/// with runs of whitespace collapsed, must be exactly one of
/// [`SUPPORTED_DATA_TYPES`], optionally followed by a modifier from
/// `TYPE_MODIFIERS` and any number of `[]` array suffixes. Arguments inside
/// the parentheses are not checked, so `VARCHAR(abc)` is accepted.
pub fn validate_data_type(data_type: &str) -> ValidationReport {
    ValidationReport::from_errors(data_type_errors(data_type))
}

fn data_type_errors(data_type: &str) -> Vec<String> {
    let trimmed = data_type.trim();
    if trimmed.is_empty() {
        return vec!["Data type cannot be empty".to_string()];
    }

    if !DATA_TYPE_CHARSET.is_match(trimmed) {
        return vec![format!(
            "Data type '{}' contains characters that are not allowed",
            data_type
        )];
    }

    let rest = PARENTHESIZED_GROUP.replace(trimmed, " ");
    if rest.contains(['(', ')', ',']) {
        return vec![format!(
            "Data type '{}' may contain only one parenthesized argument list",
            data_type
        )];
    }

    let normalized = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    if !is_supported_base(&normalized.to_uppercase()) {
        return vec![format!(
            "Unsupported data type '{}'. Supported types: {}",
            data_type,
            SUPPORTED_DATA_TYPES.join(", ")
        )];
    }

    Vec::new()
}

fn is_supported_base(normalized: &str) -> bool {
    let mut base = normalized;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped.trim_end();
    }

    if SUPPORTED_DATA_TYPES.contains(&base) {
        return true;
    }

    TYPE_MODIFIERS.iter().any(|(modifier, bases)| {
        base.strip_suffix(modifier)
            .and_then(|head| head.strip_suffix(' '))
            .is_some_and(|head| bases.contains(&head))
    })
}

/// Validate a single column definition (name and type)
pub fn validate_column(column: &ColumnDefinition) -> ValidationReport {
    let mut errors = identifier_errors(&column.name, "Column name");
    errors.extend(data_type_errors(&column.data_type));
    ValidationReport::from_errors(errors)
}

/// Validate the full column list of a new table
///
/// Each column's errors are prefixed with its 1-based position. Duplicate
/// names are compared case-insensitively. Several primary-key columns are
/// allowed and form a composite key.
pub fn validate_column_set(columns: &[ColumnDefinition]) -> ValidationReport {
    if columns.is_empty() {
        return ValidationReport::from_errors(vec![
            "At least one column is required".to_string(),
        ]);
    }

    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, column) in columns.iter().enumerate() {
        for error in validate_column(column).errors {
            errors.push(format!("Column {}: {}", index + 1, error));
        }

        let folded = column.name.trim().to_lowercase();
        if !folded.is_empty() && !seen.insert(folded) {
            errors.push(format!(
                "Column {}: Duplicate column name '{}'",
                index + 1,
                column.name
            ));
        }
    }

    ValidationReport::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // sanitize_identifier Tests
    // =========================================================================

    #[test]
    fn test_sanitize_identifier_simple() {
        assert_eq!(sanitize_identifier("my_table"), "\"my_table\"");
        assert_eq!(sanitize_identifier("users"), "\"users\"");
    }

    #[test]
    fn test_sanitize_identifier_with_quotes() {
        assert_eq!(
            sanitize_identifier("table\"with\"quotes"),
            "\"table\"\"with\"\"quotes\""
        );
        assert_eq!(sanitize_identifier("\"quoted\""), "\"\"\"quoted\"\"\"");
    }

    #[test]
    fn test_sanitize_identifier_distinct_inputs_stay_distinct() {
        let inputs = ["a", "a\"", "\"a", "a\"\"", "A", ""];
        let outputs: HashSet<String> = inputs.iter().map(|s| sanitize_identifier(s)).collect();
        assert_eq!(outputs.len(), inputs.len());

        for input in inputs {
            let out = sanitize_identifier(input);
            assert!(out.starts_with('"') && out.ends_with('"'));
        }
    }

    // =========================================================================
    // validate_identifier Tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_valid() {
        for name in ["users", "Users", "_private", "a", "table1", "my_long_table_name", "T_9"] {
            let report = validate_identifier(name);
            assert!(report.valid, "{name} should be valid: {:?}", report.errors);
            assert!(report.errors.is_empty());
        }
    }

    #[test]
    fn test_validate_identifier_max_length() {
        let name = format!("a{}", "b".repeat(62));
        assert_eq!(name.len(), 63);
        assert!(validate_identifier(&name).valid);

        let too_long = format!("{}c", name);
        let report = validate_identifier(&too_long);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("maximum length"));
    }

    #[test]
    fn test_validate_identifier_empty_short_circuits() {
        for name in ["", "   ", "\t\n"] {
            let report = validate_identifier(name);
            assert!(!report.valid);
            assert_eq!(report.errors, vec!["Identifier cannot be empty".to_string()]);
        }
    }

    #[test]
    fn test_validate_identifier_starts_with_digit() {
        assert!(!validate_identifier("1products").valid);
        assert!(!validate_identifier("0abc").valid);
    }

    #[test]
    fn test_validate_identifier_invalid_characters() {
        for name in ["my-table", "my.table", "my table", "my@table", "tëst", "a;drop", "a\"b"] {
            assert!(!validate_identifier(name).valid, "{name} should be invalid");
        }
    }

    #[test]
    fn test_validate_identifier_reserved_case_insensitive() {
        for name in ["select", "SELECT", "From", "table", "where", "join", "user", "order"] {
            let report = validate_identifier(name);
            assert!(!report.valid, "{name} should be reserved");
            assert!(report.errors[0].contains("reserved keyword"));
        }
    }

    #[test]
    fn test_validate_identifier_accumulates_errors() {
        let name = format!("9{}", "x".repeat(70));
        let report = validate_identifier(&name);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_reserved_words_contains_common_keywords() {
        for word in ["SELECT", "FROM", "WHERE", "TABLE", "CREATE", "JOIN"] {
            assert!(POSTGRES_RESERVED_WORDS.contains(&word));
        }
        assert!(POSTGRES_RESERVED_WORDS.len() > 60);
    }

    // =========================================================================
    // validate_data_type Tests
    // =========================================================================

    #[test]
    fn test_validate_data_type_accepts_whitelist() {
        for data_type in SUPPORTED_DATA_TYPES {
            assert!(validate_data_type(data_type).valid, "{data_type}");
        }
    }

    #[test]
    fn test_validate_data_type_with_arguments() {
        assert!(validate_data_type("VARCHAR(255)").valid);
        assert!(validate_data_type("DECIMAL(10,2)").valid);
        assert!(validate_data_type("numeric(12, 4)").valid);
        assert!(validate_data_type("char(3)").valid);
    }

    #[test]
    fn test_validate_data_type_double_precision() {
        assert!(validate_data_type("DOUBLE PRECISION").valid);
        assert!(validate_data_type("double precision").valid);
        assert!(!validate_data_type("DOUBLE").valid);
    }

    #[test]
    fn test_validate_data_type_unknown() {
        let report = validate_data_type("FOOBAR");
        assert!(!report.valid);
        assert!(report.errors[0].contains("Unsupported data type"));

        assert!(!validate_data_type("INT").valid);
        assert!(!validate_data_type("BLOB").valid);
    }

    #[test]
    fn test_validate_data_type_empty() {
        let report = validate_data_type("  ");
        assert_eq!(report.errors, vec!["Data type cannot be empty".to_string()]);
    }

    #[test]
    fn test_validate_data_type_does_not_check_arguments() {
        assert!(validate_data_type("VARCHAR(abc)").valid);
    }

    #[test]
    fn test_validate_data_type_modifiers_and_arrays() {
        assert!(validate_data_type("TIMESTAMP WITH TIME ZONE").valid);
        assert!(validate_data_type("timestamp(3)  without time zone").valid);
        assert!(validate_data_type("TIME WITH TIME ZONE").valid);
        assert!(validate_data_type("CHAR VARYING(20)").valid);
        assert!(validate_data_type("TEXT[]").valid);
        assert!(validate_data_type("VARCHAR(255)[]").valid);
        assert!(validate_data_type("INTEGER [][]").valid);

        assert!(!validate_data_type("INTEGER WITH TIME ZONE").valid);
        assert!(!validate_data_type("TEXT VARYING").valid);
        assert!(!validate_data_type("TEXT [").valid);
    }

    #[test]
    fn test_validate_data_type_requires_exact_base() {
        for data_type in ["TEXTUAL", "SERIALIZE", "JSONBX", "UUID PRIMARY KEY"] {
            let report = validate_data_type(data_type);
            assert!(!report.valid, "{data_type}");
            assert!(report.errors[0].contains("Unsupported data type"));
        }
    }

    #[test]
    fn test_validate_data_type_rejects_extra_clauses() {
        let report = validate_data_type("TEXT, injected INTEGER");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("only one parenthesized argument list"));

        assert!(!validate_data_type("VARCHAR(10), x TEXT").valid);
        assert!(!validate_data_type("NUMERIC(10,2) (3)").valid);
        assert!(!validate_data_type("BOOLEAN DEFAULT f(1)").valid);
        assert!(!validate_data_type("BOOLEAN DEFAULT pg_terminate_backend(1234)").valid);
        assert!(!validate_data_type("INTEGER NOT NULL").valid);
    }

    #[test]
    fn test_validate_data_type_rejects_statement_breakout() {
        assert!(!validate_data_type("TEXT); DROP TABLE users; --").valid);
        assert!(!validate_data_type("TEXT DEFAULT 'x'").valid);
        assert!(!validate_data_type("INTEGER /* c */").valid);
    }

    // =========================================================================
    // validate_column_set Tests
    // =========================================================================

    #[test]
    fn test_validate_column_set_empty() {
        let report = validate_column_set(&[]);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["At least one column is required".to_string()]);
    }

    #[test]
    fn test_validate_column_set_valid_composite_key() {
        let columns = vec![
            ColumnDefinition::new("order_id", "INTEGER").primary_key(),
            ColumnDefinition::new("line_no", "INTEGER").primary_key(),
            ColumnDefinition::new("sku", "VARCHAR(64)"),
        ];
        assert!(validate_column_set(&columns).valid);
    }

    #[test]
    fn test_validate_column_set_reports_index() {
        let columns = vec![
            ColumnDefinition::new("id", "SERIAL"),
            ColumnDefinition::new("bad-name", "TEXT"),
            ColumnDefinition::new("price", "MONEY"),
        ];
        let report = validate_column_set(&columns);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("Column 2: Column name 'bad-name'"));
        assert!(report.errors[1].starts_with("Column 3: Unsupported data type"));
    }

    #[test]
    fn test_validate_column_set_duplicates_case_insensitive() {
        let columns = vec![
            ColumnDefinition::new("Email", "TEXT"),
            ColumnDefinition::new("email", "TEXT"),
        ];
        let report = validate_column_set(&columns);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Column 2: Duplicate column name 'email'".to_string()]);
    }

    #[test]
    fn test_into_result() {
        assert!(validate_identifier("ok").into_result().is_ok());

        let err = validate_identifier("").into_result().unwrap_err();
        match err {
            AdminError::Validation { errors } => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
