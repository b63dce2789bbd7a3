//! The query builder.
//!
//! A [`Query`] accumulates clause parts through consuming builder calls and
//! compiles them into one of four statement shapes. Terminal methods
//! (`all`, `first`, `find`, `count`, `insert`, `update`, `delete`, `raw`)
//! compile and hand the statement to a [`Connection`](crate::Connection).
//!
//! ```ignore
//! use querymap::{cond, expr, table};
//!
//! let stmt = table(("authors", "author"))
//!     .filter(cond! { "role_id" => 2, "created_at" => expr::after(since) })
//!     .join_on("books b", ("author.id", "b.author_id"))
//!     .order_desc("created_at")
//!     .limit(10)
//!     .to_select()?;
//!
//! // SELECT author.* FROM authors AS author INNER JOIN books b ON (author.id = b.author_id)
//! //   WHERE author.role_id = ? AND author.created_at > ? ORDER BY author.created_at DESC LIMIT 10
//! ```
//!
//! Bare integers (and integer lists) passed to the filter methods are
//! primary-key lookups: `filter(1)` means `<pk> = 1`, `filter(vec![1, 2])`
//! means `<pk> IN (1, 2)`.

mod compile;
mod exec;


use crate::connection::Connection;
use crate::cursor::FetchAs;
use crate::dialect::{Dialect, Postgres};
use crate::expr::{self, Composite, Condition, Expr, Pair};
use crate::record::Record;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

pub use exec::Outcome;

/// Default primary key column.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// A table in the FROM list, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name bare columns are qualified with.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// `table AS alias`, or just `table`.
    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) => expr::alias(&self.table, alias),
            None => self.table.clone(),
        }
    }

    /// Like [`TableRef::render`], but drops an alias equal to the table name.
    pub(crate) fn render_for_write(&self) -> String {
        match &self.alias {
            Some(alias) if alias != &self.table => expr::alias(&self.table, alias),
            _ => self.table.clone(),
        }
    }
}

impl From<&str> for TableRef {
    fn from(table: &str) -> Self {
        TableRef::new(table)
    }
}

impl From<String> for TableRef {
    fn from(table: String) -> Self {
        TableRef::new(table)
    }
}

impl From<(&str, &str)> for TableRef {
    fn from((table, alias): (&str, &str)) -> Self {
        TableRef::aliased(table, alias)
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = crate::error::OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(crate::error::OrmError::construction(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// The ON part of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// `owner = related` pairs compared column to column, never bound.
    Columns(Vec<(String, String)>),
    /// An arbitrary condition, rendered with its own alias only.
    Condition(Composite),
}

impl From<(&str, &str)> for JoinOn {
    fn from((owner, related): (&str, &str)) -> Self {
        JoinOn::Columns(vec![(owner.to_string(), related.to_string())])
    }
}

impl<const N: usize> From<[(&str, &str); N]> for JoinOn {
    fn from(pairs: [(&str, &str); N]) -> Self {
        JoinOn::Columns(
            pairs
                .into_iter()
                .map(|(owner, related)| (owner.to_string(), related.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<(String, String)>> for JoinOn {
    fn from(pairs: Vec<(String, String)>) -> Self {
        JoinOn::Columns(pairs)
    }
}

impl From<Composite> for JoinOn {
    fn from(composite: Composite) -> Self {
        JoinOn::Condition(composite)
    }
}

impl From<Condition> for JoinOn {
    fn from(condition: Condition) -> Self {
        JoinOn::Condition(expr::all(condition))
    }
}

impl From<&str> for JoinOn {
    fn from(sql: &str) -> Self {
        JoinOn::Condition(expr::all(sql))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Join {
    table: String,
    on: Option<JoinOn>,
}

impl Join {
    /// `[INNER JOIN ]table [ON (...)]` and its binds.
    pub(crate) fn render(&self) -> (String, Vec<Value>) {
        let head = if self.table.to_ascii_uppercase().contains("JOIN") {
            self.table.clone()
        } else {
            format!("INNER JOIN {}", self.table)
        };

        let (on, binds) = match &self.on {
            None => (String::new(), Vec::new()),
            Some(JoinOn::Columns(pairs)) => {
                let mut composite = Composite::new();
                composite.all(Condition::map(
                    pairs
                        .iter()
                        .map(|(owner, related)| Pair::literal(format!("{owner} = {related}"))),
                ));
                composite.compile()
            }
            Some(JoinOn::Condition(composite)) => composite.compile(),
        };

        if on.is_empty() {
            (head, binds)
        } else {
            (format!("{head} ON ({on})"), binds)
        }
    }
}

/// A filter argument: a primary-key shorthand or a full condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Compared against the primary key (`=` for scalars, `IN` for lists).
    Key(Value),
    Condition(Condition),
}

impl Filter {
    pub fn key(value: impl Into<Value>) -> Self {
        Filter::Key(value.into())
    }

    fn resolve(self, primary_key: &str) -> Condition {
        match self {
            Filter::Key(value) => Condition::Map(vec![Pair::column(primary_key, value)]),
            Filter::Condition(condition) => condition,
        }
    }
}

macro_rules! impl_filter_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Filter {
                fn from(value: $t) -> Self {
                    Filter::Key(value.into())
                }
            }
        )*
    };
}

impl_filter_key!(i32, i64, u32, Uuid, Vec<i32>, Vec<i64>, Vec<u32>, Vec<Uuid>, &[i64], &[i32]);

macro_rules! impl_filter_condition {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Filter {
                fn from(value: $t) -> Self {
                    Filter::Condition(value.into())
                }
            }
        )*
    };
}

impl_filter_condition!(&str, String, Condition, Expr, Composite, Pair, Vec<Pair>);

/// Start a query against `table`.
pub fn table(table: impl Into<TableRef>) -> Query {
    Query::new(table)
}

/// Accumulated clause parts of one logical query.
pub struct Query<T = Record> {
    primary_key: String,
    from: Vec<TableRef>,
    alias: Option<String>,
    select: Vec<(String, Option<String>)>,
    joins: Vec<Join>,
    filter: Composite,
    having: Composite,
    group: Vec<String>,
    order: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    dialect: Arc<dyn Dialect>,
    fetch_as: FetchAs<T>,
}

impl Default for Query<Record> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Query<Record> {
    /// A query against `table` with primary key `id`.
    pub fn new(table: impl Into<TableRef>) -> Self {
        Self::empty().from(table)
    }

    /// A query against `table` with a custom primary key column.
    pub fn with_primary_key(table: impl Into<TableRef>, primary_key: impl Into<String>) -> Self {
        let mut query = Self::empty();
        query.primary_key = primary_key.into();
        query.from(table)
    }

    /// A query using the dialect of `conn`.
    pub fn with_connection(conn: &impl Connection, table: impl Into<TableRef>) -> Self {
        Self::new(table).dialect(conn.dialect())
    }

    /// A query with no table yet. Compiling it fails until `from` is called.
    pub fn empty() -> Self {
        Self {
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            from: Vec::new(),
            alias: None,
            select: Vec::new(),
            joins: Vec::new(),
            filter: Composite::new(),
            having: Composite::new(),
            group: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            dialect: Arc::new(Postgres),
            fetch_as: FetchAs::Identity,
        }
    }
}

impl<T: 'static> Query<T> {
    /// Add a table. The first table's alias (or name) qualifies bare columns.
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        let table = table.into();
        if self.alias.is_none() {
            let alias = table.qualifier().to_string();
            self.filter.set_alias(alias.clone());
            self.having.set_alias(alias.clone());
            self.alias = Some(alias);
        }
        self.from.push(table);
        self
    }

    /// Add columns to the select list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select
            .extend(columns.into_iter().map(|c| (c.into(), None)));
        self
    }

    /// Add `column AS alias` to the select list.
    pub fn select_as(mut self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        self.select.push((column.into(), Some(alias.into())));
        self
    }

    pub fn group<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    pub fn order_asc(self, column: impl Into<String>) -> Self {
        self.order(column, Direction::Asc)
    }

    pub fn order_desc(self, column: impl Into<String>) -> Self {
        self.order(column, Direction::Desc)
    }

    /// Join a table without an ON clause (`"LEFT JOIN x"` is used verbatim).
    pub fn join(mut self, table: impl Into<String>) -> Self {
        self.joins.push(Join {
            table: table.into(),
            on: None,
        });
        self
    }

    /// Join a table on column pairs or a condition.
    pub fn join_on(mut self, table: impl Into<String>, on: impl Into<JoinOn>) -> Self {
        self.joins.push(Join {
            table: table.into(),
            on: Some(on.into()),
        });
        self
    }

    /// AND a condition (or primary-key shorthand) into WHERE.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        let condition = filter.into().resolve(&self.primary_key);
        self.filter.all(condition);
        self
    }

    /// AND raw SQL with binds into WHERE.
    pub fn filter_with<V: Into<Value>>(
        mut self,
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter.all_with(sql, binds);
        self
    }

    /// OR a condition (or primary-key shorthand) into WHERE.
    pub fn filter_any(mut self, filter: impl Into<Filter>) -> Self {
        let condition = filter.into().resolve(&self.primary_key);
        self.filter.any(condition);
        self
    }

    /// OR raw SQL with binds into WHERE.
    pub fn filter_any_with<V: Into<Value>>(
        mut self,
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter.any_with(sql, binds);
        self
    }

    /// AND `NOT (<all of condition>)` into WHERE.
    pub fn exclude(mut self, filter: impl Into<Filter>) -> Self {
        let condition = filter.into().resolve(&self.primary_key);
        self.filter.all(expr::not(expr::all(condition)));
        self
    }

    /// AND `NOT (<raw sql>)` into WHERE.
    pub fn exclude_with<V: Into<Value>>(
        self,
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> Self {
        self.exclude(Condition::sql(sql, binds))
    }

    /// AND `NOT (<any of condition>)` into WHERE.
    pub fn exclude_any(mut self, filter: impl Into<Filter>) -> Self {
        let condition = filter.into().resolve(&self.primary_key);
        self.filter.all(expr::not(expr::any(condition)));
        self
    }

    /// AND a condition into HAVING.
    pub fn having(mut self, condition: impl Into<Condition>) -> Self {
        self.having.all(condition);
        self
    }

    pub fn having_with<V: Into<Value>>(
        mut self,
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> Self {
        self.having.all_with(sql, binds);
        self
    }

    /// OR a condition into HAVING.
    pub fn having_any(mut self, condition: impl Into<Condition>) -> Self {
        self.having.any(condition);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Use a different dialect for LIMIT/OFFSET and RETURNING.
    pub fn dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Map fetched rows with `fetch_as`.
    pub fn fetch_as<U: 'static>(self, fetch_as: FetchAs<U>) -> Query<U> {
        Query {
            primary_key: self.primary_key,
            from: self.from,
            alias: self.alias,
            select: self.select,
            joins: self.joins,
            filter: self.filter,
            having: self.having,
            group: self.group,
            order: self.order,
            limit: self.limit,
            offset: self.offset,
            dialect: self.dialect,
            fetch_as,
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Alias that qualifies bare columns, set by the first `from`.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name of the first table, used in error messages.
    pub fn table_name(&self) -> &str {
        self.from.first().map_or("", |t| t.table.as_str())
    }

    /// The WHERE composite.
    pub fn where_clause(&self) -> &Composite {
        &self.filter
    }

    /// The HAVING composite.
    pub fn having_clause(&self) -> &Composite {
        &self.having
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            primary_key: self.primary_key.clone(),
            from: self.from.clone(),
            alias: self.alias.clone(),
            select: self.select.clone(),
            joins: self.joins.clone(),
            filter: self.filter.clone(),
            having: self.having.clone(),
            group: self.group.clone(),
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
            dialect: Arc::clone(&self.dialect),
            fetch_as: self.fetch_as.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("from", &self.from)
            .field("primary_key", &self.primary_key)
            .field("where", &self.filter.expr())
            .field("having", &self.having.expr())
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("dialect", &self.dialect.name())
            .field("fetch_as", &self.fetch_as)
            .finish()
    }
}
