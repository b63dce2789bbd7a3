//! Predicate expressions for WHERE/HAVING/ON clauses.
//!
//! An [`Expr`] is a template containing `%s` markers for the column and `?`
//! markers for bound values. Rendering substitutes the column name verbatim;
//! values always travel in the bind list, never in the SQL text.
//!
//! ```ignore
//! use querymap::expr::{self, Composite};
//!
//! assert_eq!(expr::eq(1).render("c"), "c = ?");
//! assert_eq!(expr::not(expr::eq(1)).render("c"), "NOT (c = ?)");
//!
//! let mut where_ = Composite::new();
//! where_.set_alias("author");
//! where_.all(querymap::cond! { "name" => "test" }).any(querymap::cond! { "id" => vec![1, 2] });
//! assert_eq!(where_.expr(), "author.name = ? OR author.id IN ?");
//! ```
//!
//! Column names are trusted identifiers. They are never escaped, so user
//! input must only ever reach an expression through the bind list.

mod composite;

pub use composite::{Composite, Condition, Joiner, Operand, Pair};

use crate::value::Value;

/// A renderable predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `%s` is replaced by the column, `?` marks a bind.
    Template { sql: String, binds: Vec<Value> },

    /// `NOT (<child>)`, with the child rendered against the same column.
    /// Renders nothing when the child does.
    Not(Box<Expr>),

    /// A nested composite. The render argument acts as its alias when it has none of its own.
    Group(Composite),
}

impl Expr {
    /// Create a template expression.
    pub fn template<V: Into<Value>>(
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::Template {
            sql: sql.into(),
            binds: binds.into_iter().map(Into::into).collect(),
        }
    }

    /// Render this expression for `column`.
    pub fn render(&self, column: &str) -> String {
        match self {
            Expr::Template { sql, .. } => sql.replace("%s", column),
            Expr::Not(inner) => {
                let inner = inner.render(column);
                if inner.is_empty() {
                    inner
                } else {
                    format!("NOT ({inner})")
                }
            }
            Expr::Group(composite) => composite.expr_for(Some(column)),
        }
    }

    /// Bound values in placeholder order.
    pub fn binds(&self) -> Vec<Value> {
        match self {
            Expr::Template { binds, .. } => binds.clone(),
            Expr::Not(inner) => inner.binds(),
            Expr::Group(composite) => composite.binds(),
        }
    }
}

impl From<Composite> for Expr {
    fn from(composite: Composite) -> Self {
        Expr::Group(composite)
    }
}

/// Qualify a bare column with a table alias.
///
/// Columns that already contain `.` (qualified) or `(` (function calls such
/// as `COUNT(*)`) are returned unchanged, as is everything when the alias is
/// empty.
pub fn columnize(column: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) if !alias.is_empty() && !column.contains('.') && !column.contains('(') => {
            format!("{alias}.{column}")
        }
        _ => column.to_string(),
    }
}

/// `source AS alias`
pub fn alias(source: &str, alias: &str) -> String {
    format!("{source} AS {alias}")
}

fn single(sql: &str, value: impl Into<Value>) -> Expr {
    Expr::Template {
        sql: sql.to_string(),
        binds: vec![value.into()],
    }
}

/// `%s = ?`
pub fn eq(value: impl Into<Value>) -> Expr {
    single("%s = ?", value)
}

/// `%s <> ?`
pub fn not_eq(value: impl Into<Value>) -> Expr {
    single("%s <> ?", value)
}

/// `%s IN ?`. The list is expanded into `(?, ?, ...)` when bound.
pub fn in_list(values: impl Into<Value>) -> Expr {
    single("%s IN ?", values)
}

/// `%s > ?`
pub fn gt(value: impl Into<Value>) -> Expr {
    single("%s > ?", value)
}

/// `%s >= ?`
pub fn gte(value: impl Into<Value>) -> Expr {
    single("%s >= ?", value)
}

/// `%s < ?`
pub fn lt(value: impl Into<Value>) -> Expr {
    single("%s < ?", value)
}

/// `%s <= ?`
pub fn lte(value: impl Into<Value>) -> Expr {
    single("%s <= ?", value)
}

/// Later than `value`; same as [`gt`].
pub fn after(value: impl Into<Value>) -> Expr {
    gt(value)
}

/// Earlier than `value`; same as [`lt`].
pub fn before(value: impl Into<Value>) -> Expr {
    lt(value)
}

/// `%s LIKE ?`
pub fn like(pattern: impl Into<Value>) -> Expr {
    single("%s LIKE ?", pattern)
}

/// `%s BETWEEN ? AND ?`
pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Expr {
    Expr::Template {
        sql: "%s BETWEEN ? AND ?".to_string(),
        binds: vec![low.into(), high.into()],
    }
}

/// `%s IS NULL`
pub fn is_null() -> Expr {
    Expr::Template {
        sql: "%s IS NULL".to_string(),
        binds: Vec::new(),
    }
}

/// `%s IS NULL OR NOT %s`, both markers receiving the same column.
pub fn blank() -> Expr {
    Expr::Template {
        sql: "%s IS NULL OR NOT %s".to_string(),
        binds: Vec::new(),
    }
}

/// Negate an expression. Plain values become `eq`, lists become `in_list`.
pub fn not(operand: impl Into<Operand>) -> Expr {
    Expr::Not(Box::new(operand.into().into_expr()))
}

/// An arbitrary template, e.g. `expr("LOWER(%s) = ?", ["ann"])`.
pub fn expr<V: Into<Value>>(template: impl Into<String>, binds: impl IntoIterator<Item = V>) -> Expr {
    Expr::template(template, binds)
}

/// A new composite holding one AND-joined condition.
pub fn all(condition: impl Into<Condition>) -> Composite {
    let mut composite = Composite::new();
    composite.all(condition);
    composite
}

/// A new composite holding one OR-joined condition.
pub fn any(condition: impl Into<Condition>) -> Composite {
    let mut composite = Composite::new();
    composite.any(condition);
    composite
}

#[cfg(test)]
mod tests;
