//! The execution collaborator the query builder talks to.
//!
//! A [`Connection`] receives compiled [`Statement`]s and answers with either
//! a stream of rows or an affected-row count. Anything that can do that
//! (a Postgres client, a pooled client, an in-memory fake) can run queries.

use crate::dialect::{Dialect, Postgres};
use crate::error::OrmResult;
use crate::record::Record;
use crate::statement::Statement;
use futures_core::Stream;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

/// Maximum number of SQL bytes included in log events.
const LOG_SQL_BYTES: usize = 200;

/// A statement executor with transaction primitives.
pub trait Connection: Send + Sync {
    /// Dialect used for queries built against this connection.
    fn dialect(&self) -> Arc<dyn Dialect> {
        Arc::new(Postgres)
    }

    /// Execute a statement. Statements producing columns yield [`Output::Rows`].
    fn execute(
        &self,
        statement: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<Output>> + Send;

    /// Begin a transaction.
    fn begin(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        async move { self.execute(&Statement::raw("BEGIN")).await.map(|_| ()) }
    }

    /// Commit the current transaction.
    fn commit(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        async move { self.execute(&Statement::raw("COMMIT")).await.map(|_| ()) }
    }

    /// Roll back the current transaction.
    fn rollback(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        async move { self.execute(&Statement::raw("ROLLBACK")).await.map(|_| ()) }
    }
}

/// Result of executing a statement.
pub enum Output {
    /// Rows, fetched lazily.
    Rows(RowStream),
    /// Affected row count for statements without result columns.
    Affected(u64),
}

impl Output {
    pub fn is_rows(&self) -> bool {
        matches!(self, Output::Rows(_))
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            Output::Affected(n) => Some(*n),
            Output::Rows(_) => None,
        }
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Rows(_) => f.write_str("Rows(..)"),
            Output::Affected(n) => f.debug_tuple("Affected").field(n).finish(),
        }
    }
}

/// A boxed stream of [`Record`]s.
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = OrmResult<Record>> + Send>>,
    reported: Arc<OnceLock<u64>>,
}

impl RowStream {
    /// Create a new `RowStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = OrmResult<Record>> + Send + 'static,
    {
        Self::with_reported_count(stream, Arc::new(OnceLock::new()))
    }

    /// A stream whose driver sets `reported` to the result's row count
    /// when it is exhausted.
    pub fn with_reported_count<S>(stream: S, reported: Arc<OnceLock<u64>>) -> Self
    where
        S: Stream<Item = OrmResult<Record>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            reported,
        }
    }

    /// Row count reported by the driver, once available.
    pub fn reported_count(&self) -> Option<u64> {
        self.reported.get().copied()
    }

    /// A stream over rows that are already in memory.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(futures_util::stream::iter(records.into_iter().map(Ok)))
    }
}

impl Stream for RowStream {
    type Item = OrmResult<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Execute `statement` on `conn`, logging it first.
pub(crate) async fn run(conn: &impl Connection, statement: &Statement) -> OrmResult<Output> {
    tracing::debug!(
        target: "querymap.sql",
        param_count = statement.param_count(),
        types = ?statement.types(),
        sql = %statement.truncated_sql(LOG_SQL_BYTES),
    );
    conn.execute(statement).await
}
