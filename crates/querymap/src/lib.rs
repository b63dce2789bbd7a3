//! # querymap
//!
//! Composable SQL expressions, a parameterized query builder and lazy row
//! cursors for PostgreSQL.
//!
//! ## Features
//!
//! - **Injection-safe**: values only ever travel as bound parameters; SQL text is built from trusted identifiers
//! - **Composable predicates**: `eq`, `in_list`, `between`, `not`, ... combined with AND/OR in a [`Composite`]
//! - **Alias-aware**: bare columns are qualified with the query's table alias
//! - **Lazy cursors**: rows are fetched one at a time and cached by position
//! - **Transaction-friendly**: [`transactional`] commits on `Ok` and rolls back on `Err`
//!
//! ## Example
//!
//! ```ignore
//! use querymap::{cond, expr, table};
//!
//! let query = table(("authors", "author"))
//!     .filter(cond! { "role_id" => vec![1, 2] })
//!     .exclude(cond! { "banned" => true })
//!     .order_asc("name");
//!
//! let stmt = query.to_select()?;
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT author.* FROM authors AS author \
//!      WHERE author.role_id IN ? AND NOT (author.banned = ?) ORDER BY author.name ASC"
//! );
//!
//! let author = query.find_where(&client, 1).await?;
//! ```

pub mod config;
pub mod connection;
pub mod cursor;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod postgres;
pub mod query;
pub mod record;
pub mod statement;
pub mod transaction;
pub mod value;

pub use config::DbConfig;
pub use connection::{Connection, Output, RowStream};
pub use cursor::{FetchAs, Rows};
pub use dialect::{Ansi, Dialect, DialectKind, Postgres};
pub use error::{OrmError, OrmResult};
pub use expr::{Composite, Condition, Expr, Operand, Pair};
pub use query::{Direction, Filter, JoinOn, Outcome, Query, TableRef, table};
pub use record::{FromRecord, Record};
pub use statement::Statement;
pub use transaction::transactional;
pub use value::{ParamType, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PoolRegistry, create_pool, create_pool_with_config};
