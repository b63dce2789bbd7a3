use super::{Expr, columnize, eq, in_list};
use crate::value::Value;
use std::sync::OnceLock;

/// How a leaf attaches to whatever precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn as_sql(self) -> &'static str {
        match self {
            Joiner::And => " AND ",
            Joiner::Or => " OR ",
        }
    }
}

/// Right-hand side of a column entry in a mapping condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Expr(Expr),
}

impl Operand {
    /// Lists become `IN ?`, other values `= ?`, expressions stay as they are.
    pub fn into_expr(self) -> Expr {
        match self {
            Operand::Value(value @ Value::List(_)) => in_list(value),
            Operand::Value(value) => eq(value),
            Operand::Expr(expr) => expr,
        }
    }
}

impl From<Expr> for Operand {
    fn from(expr: Expr) -> Self {
        Operand::Expr(expr)
    }
}

impl From<Composite> for Operand {
    fn from(composite: Composite) -> Self {
        Operand::Expr(Expr::Group(composite))
    }
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Value(value.into())
    }
}

/// One entry of a mapping condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Pair {
    /// Literal SQL emitted as its own leaf, without binds or qualification.
    Literal(String),
    /// A column (qualified with the composite's alias) and its operand.
    Column(String, Operand),
}

impl Pair {
    pub fn literal(sql: impl Into<String>) -> Self {
        Pair::Literal(sql.into())
    }

    pub fn column(column: impl Into<String>, operand: impl Into<Operand>) -> Self {
        Pair::Column(column.into(), operand.into())
    }
}

/// The source of a composite entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Verbatim SQL with its own binds; never qualified.
    Raw { sql: String, binds: Vec<Value> },
    /// An expression rendered against the composite's alias.
    Expr(Expr),
    /// Column/value pairs, each expanding into its own leaf.
    Map(Vec<Pair>),
}

impl Condition {
    /// Raw SQL with binds, e.g. `Condition::sql("name = ?", ["ann"])`.
    pub fn sql<V: Into<Value>>(sql: impl Into<String>, binds: impl IntoIterator<Item = V>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            binds: binds.into_iter().map(Into::into).collect(),
        }
    }

    /// Raw SQL without binds.
    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// A mapping condition from pairs.
    pub fn map(pairs: impl IntoIterator<Item = Pair>) -> Self {
        Condition::Map(pairs.into_iter().collect())
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::raw(sql)
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::raw(sql)
    }
}

impl From<Expr> for Condition {
    fn from(expr: Expr) -> Self {
        Condition::Expr(expr)
    }
}

impl From<Composite> for Condition {
    fn from(composite: Composite) -> Self {
        Condition::Expr(Expr::Group(composite))
    }
}

impl From<Vec<Pair>> for Condition {
    fn from(pairs: Vec<Pair>) -> Self {
        Condition::Map(pairs)
    }
}

impl From<Pair> for Condition {
    fn from(pair: Pair) -> Self {
        Condition::Map(vec![pair])
    }
}

/// Build a mapping [`Condition`].
///
/// ```ignore
/// let c = cond! { "name" => "ann", "id" => vec![1, 2], "age" => expr::gt(18) };
/// ```
#[macro_export]
macro_rules! cond {
    () => {
        $crate::expr::Condition::Map(::std::vec::Vec::new())
    };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::expr::Condition::Map(::std::vec![
            $($crate::expr::Pair::column($column, $value)),+
        ])
    };
}

/// AND/OR-joined conditions compiled into one boolean expression.
///
/// Compilation walks entries in insertion order and flattens each into
/// leaves. The result is cached until the composite is modified.
#[derive(Debug, Default)]
pub struct Composite {
    entries: Vec<(Joiner, Condition)>,
    alias: Option<String>,
    compiled: OnceLock<(String, Vec<Value>)>,
}

impl Clone for Composite {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            alias: self.alias.clone(),
            compiled: OnceLock::new(),
        }
    }
}

impl PartialEq for Composite {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.alias == other.alias
    }
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an AND-joined condition.
    pub fn all(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.push(Joiner::And, condition.into())
    }

    /// Append an OR-joined condition.
    pub fn any(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.push(Joiner::Or, condition.into())
    }

    /// Append AND-joined raw SQL with binds.
    pub fn all_with<V: Into<Value>>(
        &mut self,
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push(Joiner::And, Condition::sql(sql, binds))
    }

    /// Append OR-joined raw SQL with binds.
    pub fn any_with<V: Into<Value>>(
        &mut self,
        sql: impl Into<String>,
        binds: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push(Joiner::Or, Condition::sql(sql, binds))
    }

    fn push(&mut self, joiner: Joiner, condition: Condition) -> &mut Self {
        self.entries.push((joiner, condition));
        self.compiled = OnceLock::new();
        self
    }

    /// Set the alias used to qualify bare mapping columns.
    pub fn set_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.alias = Some(alias.into());
        self.compiled = OnceLock::new();
        self
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The compiled SQL, using this composite's own alias.
    pub fn expr(&self) -> String {
        self.compiled().0.clone()
    }

    /// The compiled binds in placeholder order.
    pub fn binds(&self) -> Vec<Value> {
        self.compiled().1.clone()
    }

    /// Compiled `(sql, binds)`; an empty composite yields `("", [])`.
    pub fn compile(&self) -> (String, Vec<Value>) {
        self.compiled().clone()
    }

    /// Compiled SQL, qualifying with `fallback` when no alias of our own is set.
    pub fn expr_for(&self, fallback: Option<&str>) -> String {
        match (&self.alias, fallback) {
            (None, Some(fallback)) => self.build(Some(fallback)).0,
            _ => self.expr(),
        }
    }

    fn compiled(&self) -> &(String, Vec<Value>) {
        self.compiled.get_or_init(|| self.build(self.alias.as_deref()))
    }

    fn build(&self, alias: Option<&str>) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut binds = Vec::new();

        for (joiner, condition) in &self.entries {
            for (fragment, fragment_binds) in leaves(condition, alias) {
                // Empty groups contribute nothing, not even a joiner.
                if fragment.trim().is_empty() {
                    continue;
                }
                if !sql.is_empty() {
                    sql.push_str(joiner.as_sql());
                }
                sql.push_str(&fragment);
                binds.extend(fragment_binds);
            }
        }

        (sql, binds)
    }
}

fn leaves(condition: &Condition, alias: Option<&str>) -> Vec<(String, Vec<Value>)> {
    match condition {
        Condition::Raw { sql, binds } => vec![(sql.clone(), binds.clone())],
        Condition::Expr(expr) => vec![(expr.render(alias.unwrap_or_default()), expr.binds())],
        Condition::Map(pairs) => pairs
            .iter()
            .map(|pair| match pair {
                Pair::Literal(sql) => (sql.clone(), Vec::new()),
                Pair::Column(column, operand) => {
                    let column = columnize(column, alias);
                    let expr = operand.clone().into_expr();
                    (expr.render(&column), expr.binds())
                }
            })
            .collect(),
    }
}
