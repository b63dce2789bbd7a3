//! Compiled statements: SQL text plus ordered parameters.

use crate::value::{ParamType, Value};

/// A compiled statement.
///
/// `params[i]` binds the `i`-th `?` placeholder in `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Parameter classifications, one per parameter.
    pub fn types(&self) -> Vec<ParamType> {
        self.params.iter().map(Value::param_type).collect()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// SQL cut to at most `max_bytes`, on a char boundary, for log output.
    pub(crate) fn truncated_sql(&self, max_bytes: usize) -> &str {
        let sql = self.sql.as_str();
        if sql.len() <= max_bytes {
            return sql;
        }
        let mut end = max_bytes;
        while end > 0 && !sql.is_char_boundary(end) {
            end -= 1;
        }
        &sql[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_follow_params() {
        let stmt = Statement::new(
            "SELECT * FROM t WHERE a = ? AND b IN ?",
            vec![Value::from(true), Value::from(vec![1, 2])],
        );
        assert_eq!(stmt.types(), vec![ParamType::Boolean, ParamType::IntegerList]);
        assert_eq!(stmt.param_count(), 2);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let stmt = Statement::raw("SELECT 'é'");
        assert_eq!(stmt.truncated_sql(9), "SELECT '");
        assert_eq!(stmt.truncated_sql(100), "SELECT 'é'");
    }
}
