//! Statement compilation for [`Query`].

use super::Query;
use crate::error::{OrmError, OrmResult};
use crate::expr::{alias, columnize};
use crate::statement::Statement;
use crate::value::Value;

impl<T: 'static> Query<T> {
    /// Compile a SELECT.
    ///
    /// Clause order: columns, tables, joins, WHERE, GROUP BY, HAVING,
    /// ORDER BY, then the dialect's limit syntax.
    pub fn to_select(&self) -> OrmResult<Statement> {
        self.require_from("SELECT")?;

        let mut parts = vec![
            format!("SELECT {}", self.compile_columns()),
            format!("FROM {}", self.compile_from(false)),
        ];
        let mut params = Vec::new();

        self.compile_joins(&mut parts, &mut params);
        self.compile_where(&mut parts, &mut params);

        if !self.group.is_empty() {
            let columns: Vec<String> = self
                .group
                .iter()
                .map(|c| columnize(c, self.alias()))
                .collect();
            parts.push(format!("GROUP BY {}", columns.join(", ")));
        }

        let (having, having_binds) = self.having.compile();
        if !having.is_empty() {
            parts.push(format!("HAVING {having}"));
            params.extend(having_binds);
        }

        self.compile_order(&mut parts);

        Ok(Statement::new(self.compile_limit(parts.join(" ")), params))
    }

    /// Compile an INSERT of `data` (column/value pairs).
    pub fn to_insert<K, V>(&self, data: impl IntoIterator<Item = (K, V)>) -> OrmResult<Statement>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.require_from("INSERT")?;
        let (columns, params) = split(data);
        if columns.is_empty() {
            return Err(OrmError::construction(format!(
                "nothing to insert into '{}'",
                self.table_name()
            )));
        }

        let placeholders = vec!["?"; columns.len()].join(",");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.compile_from(true),
            columns.join(",")
        );
        Ok(Statement::new(sql, params))
    }

    /// Compile an UPDATE setting `data` (column/value pairs).
    pub fn to_update<K, V>(&self, data: impl IntoIterator<Item = (K, V)>) -> OrmResult<Statement>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.require_from("UPDATE")?;
        let (columns, mut params) = split(data);
        if columns.is_empty() {
            return Err(OrmError::construction(format!(
                "nothing to update in '{}'",
                self.table_name()
            )));
        }

        let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        let mut parts = vec![
            format!("UPDATE {}", self.compile_from(true)),
            format!("SET {}", assignments.join(", ")),
        ];
        self.compile_where(&mut parts, &mut params);

        Ok(Statement::new(self.compile_limit(parts.join(" ")), params))
    }

    /// Compile a DELETE.
    pub fn to_delete(&self) -> OrmResult<Statement> {
        self.require_from("DELETE")?;

        let mut parts = vec![format!("DELETE FROM {}", self.compile_from(true))];
        let mut params = Vec::new();

        self.compile_joins(&mut parts, &mut params);
        self.compile_where(&mut parts, &mut params);
        self.compile_order(&mut parts);

        Ok(Statement::new(self.compile_limit(parts.join(" ")), params))
    }

    /// Debug helper: the SELECT text, or an empty string when it cannot compile.
    pub fn to_sql(&self) -> String {
        self.to_select().map(|s| s.sql).unwrap_or_default()
    }

    fn require_from(&self, kind: &str) -> OrmResult<()> {
        if self.from.is_empty() {
            return Err(OrmError::construction(format!(
                "cannot compile {kind}: no table given, call from() first"
            )));
        }
        Ok(())
    }

    fn compile_columns(&self) -> String {
        if self.select.is_empty() {
            return columnize("*", self.alias());
        }
        let columns: Vec<String> = self
            .select
            .iter()
            .map(|(column, name)| {
                let column = columnize(column, self.alias());
                match name {
                    Some(name) => alias(&column, name),
                    None => column,
                }
            })
            .collect();
        columns.join(", ")
    }

    fn compile_from(&self, write: bool) -> String {
        let tables: Vec<String> = self
            .from
            .iter()
            .map(|t| if write { t.render_for_write() } else { t.render() })
            .collect();
        tables.join(", ")
    }

    fn compile_joins(&self, parts: &mut Vec<String>, params: &mut Vec<Value>) {
        for join in &self.joins {
            let (sql, binds) = join.render();
            parts.push(sql);
            params.extend(binds);
        }
    }

    fn compile_where(&self, parts: &mut Vec<String>, params: &mut Vec<Value>) {
        let (sql, binds) = self.filter.compile();
        if !sql.is_empty() {
            parts.push(format!("WHERE {sql}"));
            params.extend(binds);
        }
    }

    fn compile_order(&self, parts: &mut Vec<String>) {
        if self.order.is_empty() {
            return;
        }
        let columns: Vec<String> = self
            .order
            .iter()
            .map(|(column, direction)| {
                format!("{} {}", columnize(column, self.alias()), direction.as_sql())
            })
            .collect();
        parts.push(format!("ORDER BY {}", columns.join(", ")));
    }

    /// Zero counts as unset for both limit and offset.
    fn compile_limit(&self, sql: String) -> String {
        let limit = self.limit.filter(|n| *n > 0);
        let offset = self.offset.filter(|n| *n > 0);
        if limit.is_none() && offset.is_none() {
            return sql;
        }
        self.dialect.apply_limit(sql, limit, offset)
    }
}

fn split<K, V>(data: impl IntoIterator<Item = (K, V)>) -> (Vec<String>, Vec<Value>)
where
    K: Into<String>,
    V: Into<Value>,
{
    data.into_iter().map(|(k, v)| (k.into(), v.into())).unzip()
}
