//! Terminal operations: compile, execute, wrap the result.

use super::{Filter, Query};
use crate::connection::{Connection, Output, run};
use crate::cursor::{FetchAs, Rows};
use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::statement::Statement;
use crate::value::Value;

/// Result of [`Query::raw`].
#[derive(Debug)]
pub enum Outcome<T> {
    Rows(Rows<T>),
    Affected(u64),
}

impl<T: 'static> Outcome<T> {
    pub fn into_rows(self) -> Option<Rows<T>> {
        match self {
            Outcome::Rows(rows) => Some(rows),
            Outcome::Affected(_) => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            Outcome::Affected(n) => Some(*n),
            Outcome::Rows(_) => None,
        }
    }
}

impl<T: 'static> Query<T> {
    /// Execute `statement` verbatim. Row-producing statements yield a cursor
    /// using this query's fetch strategy, others the affected row count.
    pub async fn raw(&self, conn: &impl Connection, statement: Statement) -> OrmResult<Outcome<T>> {
        match run(conn, &statement).await? {
            Output::Rows(stream) => Ok(Outcome::Rows(Rows::new(stream, self.fetch_as.clone()))),
            Output::Affected(n) => Ok(Outcome::Affected(n)),
        }
    }

    /// Run the SELECT and return a lazy cursor.
    pub async fn all(&self, conn: &impl Connection) -> OrmResult<Rows<T>> {
        let statement = self.to_select()?;
        match run(conn, &statement).await? {
            Output::Rows(stream) => Ok(Rows::new(stream, self.fetch_as.clone())),
            Output::Affected(_) => Err(OrmError::unexpected(
                "SELECT produced an affected count instead of rows",
            )),
        }
    }

    /// [`Query::all`] with an extra AND-ed filter, leaving `self` untouched.
    pub async fn all_where(
        &self,
        conn: &impl Connection,
        filter: impl Into<Filter>,
    ) -> OrmResult<Rows<T>> {
        self.clone().filter(filter).all(conn).await
    }

    /// The first row, or `None` when nothing matches.
    pub async fn first(&self, conn: &impl Connection) -> OrmResult<Option<T>> {
        let mut rows = self.clone().limit(1).all(conn).await?;
        rows.next().await
    }

    pub async fn first_where(
        &self,
        conn: &impl Connection,
        filter: impl Into<Filter>,
    ) -> OrmResult<Option<T>> {
        self.clone().filter(filter).first(conn).await
    }

    /// The first row; no match is [`OrmError::NotFound`].
    pub async fn find(&self, conn: &impl Connection) -> OrmResult<T> {
        match self.first(conn).await? {
            Some(value) => Ok(value),
            None => Err(OrmError::not_found(
                self.table_name(),
                self.describe_where(),
            )),
        }
    }

    pub async fn find_where(&self, conn: &impl Connection, filter: impl Into<Filter>) -> OrmResult<T> {
        self.clone().filter(filter).find(conn).await
    }

    /// Number of rows the SELECT produces.
    pub async fn count(&self, conn: &impl Connection) -> OrmResult<u64> {
        self.all(conn).await?.row_count().await
    }

    pub async fn count_where(&self, conn: &impl Connection, filter: impl Into<Filter>) -> OrmResult<u64> {
        self.clone().filter(filter).count(conn).await
    }

    /// Insert `data` and return the generated primary key, when the dialect can report it.
    ///
    /// The whole inserted row is returned, so tables whose key column is not
    /// the configured primary key still yield their first column.
    pub async fn insert<K, V>(
        &self,
        conn: &impl Connection,
        data: impl IntoIterator<Item = (K, V)>,
    ) -> OrmResult<Option<Value>>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut statement = self.to_insert(data)?;
        if let Some(returning) = self.dialect.returning("*") {
            statement.sql.push_str(&returning);
        }

        match run(conn, &statement).await? {
            Output::Rows(stream) => {
                let mut rows: Rows<Record> = Rows::new(stream, FetchAs::Identity);
                if !rows.has_next().await? {
                    return Ok(None);
                }
                Ok(rows.current_record().and_then(|record| {
                    record
                        .get(&self.primary_key)
                        .or_else(|| record.first_value())
                        .cloned()
                }))
            }
            Output::Affected(_) => Ok(None),
        }
    }

    /// Update matching rows with `data`; returns the affected row count.
    pub async fn update<K, V>(
        &self,
        conn: &impl Connection,
        data: impl IntoIterator<Item = (K, V)>,
    ) -> OrmResult<u64>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let statement = self.to_update(data)?;
        affected(run(conn, &statement).await?).await
    }

    pub async fn update_where<K, V>(
        &self,
        conn: &impl Connection,
        filter: impl Into<Filter>,
        data: impl IntoIterator<Item = (K, V)>,
    ) -> OrmResult<u64>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.clone().filter(filter).update(conn, data).await
    }

    /// Delete matching rows; returns the affected row count.
    pub async fn delete(&self, conn: &impl Connection) -> OrmResult<u64> {
        let statement = self.to_delete()?;
        affected(run(conn, &statement).await?).await
    }

    pub async fn delete_where(&self, conn: &impl Connection, filter: impl Into<Filter>) -> OrmResult<u64> {
        self.clone().filter(filter).delete(conn).await
    }

    fn describe_where(&self) -> String {
        let (sql, binds) = self.filter.compile();
        if sql.is_empty() {
            return "no condition".to_string();
        }
        if binds.is_empty() {
            return sql;
        }
        let shown: Vec<String> = binds.iter().map(ToString::to_string).collect();
        format!("{sql} [{}]", shown.join(", "))
    }
}

async fn affected(output: Output) -> OrmResult<u64> {
    match output {
        Output::Affected(n) => Ok(n),
        Output::Rows(stream) => Rows::<Record>::new(stream, FetchAs::Identity).row_count().await,
    }
}
