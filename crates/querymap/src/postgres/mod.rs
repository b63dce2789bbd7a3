//! [`Connection`] implementations for tokio-postgres and deadpool-postgres clients.

pub mod bind;

use crate::connection::{Connection, Output, RowStream};
use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::statement::Statement;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_core::Stream;
use rust_decimal::Decimal;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql, Type};
use uuid::Uuid;

impl Connection for tokio_postgres::Client {
    async fn execute(&self, statement: &Statement) -> OrmResult<Output> {
        execute_on(self, statement).await
    }

    async fn begin(&self) -> OrmResult<()> {
        batch(self, "BEGIN").await
    }

    async fn commit(&self) -> OrmResult<()> {
        batch(self, "COMMIT").await
    }

    async fn rollback(&self) -> OrmResult<()> {
        batch(self, "ROLLBACK").await
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::ClientWrapper {
    async fn execute(&self, statement: &Statement) -> OrmResult<Output> {
        execute_on(self, statement).await
    }

    async fn begin(&self) -> OrmResult<()> {
        batch(self, "BEGIN").await
    }

    async fn commit(&self) -> OrmResult<()> {
        batch(self, "COMMIT").await
    }

    async fn rollback(&self) -> OrmResult<()> {
        batch(self, "ROLLBACK").await
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    async fn execute(&self, statement: &Statement) -> OrmResult<Output> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        Connection::execute(&**self, statement).await
    }

    async fn begin(&self) -> OrmResult<()> {
        Connection::begin(&**self).await
    }

    async fn commit(&self) -> OrmResult<()> {
        Connection::commit(&**self).await
    }

    async fn rollback(&self) -> OrmResult<()> {
        Connection::rollback(&**self).await
    }
}

async fn batch(client: &tokio_postgres::Client, sql: &str) -> OrmResult<()> {
    client
        .batch_execute(sql)
        .await
        .map_err(OrmError::from_db_error)
}

/// Bind and run `statement`, streaming rows when the statement has result columns.
pub async fn execute_on(client: &tokio_postgres::Client, statement: &Statement) -> OrmResult<Output> {
    let (sql, params) = bind::expand(&statement.sql, &statement.params)?;
    let prepared = client.prepare(&sql).await.map_err(OrmError::from_db_error)?;
    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

    if prepared.columns().is_empty() {
        let affected = tokio_postgres::Client::execute(client, &prepared, &refs)
            .await
            .map_err(OrmError::from_db_error)?;
        return Ok(Output::Affected(affected));
    }

    let stream = client
        .query_raw(&prepared, refs.iter().copied())
        .await
        .map_err(OrmError::from_db_error)?;
    let reported = Arc::new(OnceLock::new());
    let records = Records {
        rows: Box::pin(stream),
        reported: Arc::clone(&reported),
    };
    Ok(Output::Rows(RowStream::with_reported_count(records, reported)))
}

/// Rows decoded into [`Record`]s. Publishes the command tag's row count
/// once the server has sent it.
struct Records {
    rows: Pin<Box<tokio_postgres::RowStream>>,
    reported: Arc<OnceLock<u64>>,
}

impl Stream for Records {
    type Item = OrmResult<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match this.rows.as_mut().poll_next(cx) {
            Poll::Ready(Some(row)) => Poll::Ready(Some(
                row.map_err(OrmError::from_db_error)
                    .and_then(|row| record_from_row(&row)),
            )),
            Poll::Ready(None) => {
                if let Some(n) = this.rows.rows_affected() {
                    let _ = this.reported.set(n);
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Convert a Postgres row into a [`Record`], column by column.
pub fn record_from_row(row: &Row) -> OrmResult<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.type_())
            .map_err(|message| OrmError::decode(column.name(), message))?;
        record.push(column.name(), value);
    }
    Ok(record)
}

fn opt<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>, String> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| e.to_string())
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> Result<Value, String> {
    let value = match *ty {
        Type::BOOL => opt::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => opt::<i16>(row, idx)?.map(Value::from),
        Type::INT4 => opt::<i32>(row, idx)?.map(Value::from),
        Type::INT8 => opt::<i64>(row, idx)?.map(Value::Int),
        Type::OID => opt::<u32>(row, idx)?.map(Value::from),
        Type::FLOAT4 => opt::<f32>(row, idx)?.map(Value::from),
        Type::FLOAT8 => opt::<f64>(row, idx)?.map(Value::Float),
        Type::NUMERIC => opt::<Decimal>(row, idx)?.map(Value::Decimal),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            opt::<String>(row, idx)?.map(Value::Text)
        }
        Type::TIMESTAMP => opt::<NaiveDateTime>(row, idx)?.map(Value::Timestamp),
        Type::TIMESTAMPTZ => opt::<DateTime<Utc>>(row, idx)?.map(Value::from),
        Type::DATE => opt::<NaiveDate>(row, idx)?.map(Value::from),
        Type::UUID => opt::<Uuid>(row, idx)?.map(Value::Uuid),
        Type::JSON | Type::JSONB => opt::<serde_json::Value>(row, idx)?.map(Value::Json),
        Type::BOOL_ARRAY => opt::<Vec<bool>>(row, idx)?.map(Value::from),
        Type::INT2_ARRAY => opt::<Vec<i16>>(row, idx)?.map(Value::from),
        Type::INT4_ARRAY => opt::<Vec<i32>>(row, idx)?.map(Value::from),
        Type::INT8_ARRAY => opt::<Vec<i64>>(row, idx)?.map(Value::from),
        Type::NUMERIC_ARRAY => opt::<Vec<Decimal>>(row, idx)?.map(Value::from),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => opt::<Vec<String>>(row, idx)?.map(Value::from),
        _ => return Err(format!("unsupported column type {ty}")),
    };
    Ok(value.unwrap_or(Value::Null))
}
