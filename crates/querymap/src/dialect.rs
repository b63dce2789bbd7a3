//! Database-specific syntax the builder cannot express portably.

use crate::error::{OrmError, OrmResult};
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

/// Hooks for LIMIT/OFFSET syntax and generated-key retrieval.
pub trait Dialect: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Append limit/offset syntax to a compiled statement.
    fn apply_limit(&self, sql: String, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Suffix that makes an INSERT return `columns` (`*` for the whole row), if supported.
    fn returning(&self, columns: &str) -> Option<String> {
        let _ = columns;
        None
    }
}

/// PostgreSQL: `LIMIT n OFFSET m`, `RETURNING *`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn apply_limit(&self, mut sql: String, limit: Option<u64>, offset: Option<u64>) -> String {
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    fn returning(&self, columns: &str) -> Option<String> {
        Some(format!(" RETURNING {columns}"))
    }
}

/// SQL:2008 row limiting: `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ansi;

impl Dialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn apply_limit(&self, mut sql: String, limit: Option<u64>, offset: Option<u64>) -> String {
        sql.push_str(&format!(" OFFSET {} ROWS", offset.unwrap_or(0)));
        if let Some(limit) = limit {
            sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        sql
    }
}

/// Dialect selected by name, as found in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectKind {
    #[default]
    Postgres,
    Ansi,
}

impl DialectKind {
    pub fn into_dialect(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Postgres => Arc::new(Postgres),
            DialectKind::Ansi => Arc::new(Ansi),
        }
    }
}

impl FromStr for DialectKind {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "ansi" | "sql2008" => Ok(DialectKind::Ansi),
            other => Err(OrmError::Config(format!("unknown dialect: {other}"))),
        }
    }
}
