//! Named bind parameters
//!
//! Generated statements refer to values as `:name`. PostgreSQL only knows
//! positional `$n` parameters, so statements are compiled before execution.

use serde::Serialize;

const REDACTED_KEYS: &[&str] = &["password", "secret", "token"];

/// A value bound to a named placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

/// Ordered set of named parameter values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    entries: Vec<(String, SqlValue)>,
}

impl NamedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a value for `:name`
    pub fn with(mut self, name: &str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Render for diagnostics, masking values whose names look like secrets
    pub fn redacted(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.entries {
            let lowered = name.to_lowercase();
            let rendered = if REDACTED_KEYS.iter().any(|key| lowered.contains(key)) {
                serde_json::Value::String("***".to_string())
            } else {
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
            };
            map.insert(name.clone(), rendered);
        }
        serde_json::Value::Object(map)
    }
}

/// A statement rewritten to positional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSql {
    /// SQL with `$1`, `$2`, ... in place of named placeholders
    pub sql: String,
    /// Parameter name for each position (`names[0]` is `$1`)
    pub names: Vec<String>,
}

impl CompiledSql {
    /// Resolve the positional values, failing on the first missing name
    pub fn resolve<'a>(&self, params: &'a NamedParams) -> Result<Vec<&'a SqlValue>, String> {
        self.names
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .ok_or_else(|| format!("Missing value for bind parameter :{}", name))
            })
            .collect()
    }
}

/// Rewrite `:name` placeholders into `$n`
///
/// Repeated names share one position. `::` casts and anything inside single
/// quoted literals or double quoted identifiers are left untouched.
pub fn compile_named(sql: &str) -> CompiledSql {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                // Copy the quoted section verbatim; doubled quotes stay inside it.
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == c {
                        if i + 1 < chars.len() && chars[i + 1] == c {
                            out.push(c);
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            ':' if i + 1 < chars.len() && chars[i + 1] == ':' => {
                out.push_str("::");
                i += 2;
            }
            ':' if i + 1 < chars.len() && (chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_') => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let position = match names.iter().position(|n| *n == name) {
                    Some(existing) => existing + 1,
                    None => {
                        names.push(name);
                        names.len()
                    }
                };
                out.push('$');
                out.push_str(&position.to_string());
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    CompiledSql { sql: out, names }
}
