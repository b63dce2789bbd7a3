//! Lazy, forward-fetching row cursors and row mapping strategies.
//!
//! A [`Rows`] cursor pulls at most one row from the underlying stream per
//! [`Rows::has_next`] call and keeps every fetched row keyed by position, so
//! counting and then iterating (or rewinding) never re-executes the query.
//!
//! ```ignore
//! let mut rows = querymap::table("authors").all(&client).await?;
//! while let Some(record) = rows.next().await? {
//!     println!("{:?}", record.get("name"));
//! }
//! ```

use crate::connection::RowStream;
use crate::error::{OrmError, OrmResult};
use crate::record::{FromRecord, Record};
use futures_util::StreamExt;
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How fetched rows are turned into `T`.
pub enum FetchAs<T> {
    /// Hand out the [`Record`] as-is. Only valid when `T` is `Record`.
    Identity,
    /// Convert to a JSON object. Only valid when `T` is `serde_json::Value`.
    Object,
    /// A caller-supplied closure.
    Callback(Arc<dyn Fn(Record) -> OrmResult<T> + Send + Sync>),
    /// A constructor, typically [`FromRecord::from_record`].
    Type(fn(&Record) -> OrmResult<T>),
}

impl<T: 'static> FetchAs<T> {
    pub fn callback(f: impl Fn(Record) -> OrmResult<T> + Send + Sync + 'static) -> Self {
        FetchAs::Callback(Arc::new(f))
    }

    /// Map rows through `T::from_record`.
    pub fn of() -> Self
    where
        T: FromRecord,
    {
        FetchAs::Type(T::from_record)
    }

    /// Resolve a built-in strategy by name: `record`/`array` or `object`.
    ///
    /// Unknown names, and names whose output type is not `T`, are rejected.
    pub fn parse(name: &str) -> OrmResult<Self> {
        let strategy = match name.trim().to_ascii_lowercase().as_str() {
            "record" | "array" | "identity" => FetchAs::Identity,
            "object" => FetchAs::Object,
            other => {
                return Err(OrmError::unexpected(format!(
                    "unknown fetch strategy '{other}'"
                )));
            }
        };
        strategy.check()?;
        Ok(strategy)
    }

    /// Verify that a built-in strategy produces `T`.
    pub fn check(&self) -> OrmResult<()> {
        let ok = match self {
            FetchAs::Identity => is::<Record, T>(),
            FetchAs::Object => is::<serde_json::Value, T>(),
            FetchAs::Callback(_) | FetchAs::Type(_) => true,
        };
        if ok {
            Ok(())
        } else {
            Err(OrmError::unexpected(format!(
                "fetch strategy {self:?} cannot produce {}",
                std::any::type_name::<T>()
            )))
        }
    }

    /// Map one row.
    pub fn map(&self, record: Record) -> OrmResult<T> {
        match self {
            FetchAs::Identity => cast(record),
            FetchAs::Object => cast(record.into_json()),
            FetchAs::Callback(f) => f(record),
            FetchAs::Type(f) => f(&record),
        }
    }
}

fn is<S: 'static, T: 'static>() -> bool {
    std::any::TypeId::of::<S>() == std::any::TypeId::of::<T>()
}

fn cast<S: 'static, T: 'static>(value: S) -> OrmResult<T> {
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<T>>()
        .and_then(Option::take)
        .ok_or_else(|| {
            OrmError::unexpected(format!(
                "cannot hand out {} as {}",
                std::any::type_name::<S>(),
                std::any::type_name::<T>()
            ))
        })
}

impl<T> Default for FetchAs<T> {
    fn default() -> Self {
        FetchAs::Identity
    }
}

impl<T> Clone for FetchAs<T> {
    fn clone(&self) -> Self {
        match self {
            FetchAs::Identity => FetchAs::Identity,
            FetchAs::Object => FetchAs::Object,
            FetchAs::Callback(f) => FetchAs::Callback(Arc::clone(f)),
            FetchAs::Type(f) => FetchAs::Type(*f),
        }
    }
}

impl<T> fmt::Debug for FetchAs<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchAs::Identity => f.write_str("Identity"),
            FetchAs::Object => f.write_str("Object"),
            FetchAs::Callback(_) => f.write_str("Callback(..)"),
            FetchAs::Type(_) => f.write_str("Type(..)"),
        }
    }
}

impl FromStr for FetchAs<Record> {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        FetchAs::parse(s)
    }
}

/// A forward-fetching cursor over a result set.
pub struct Rows<T = Record> {
    stream: RowStream,
    cache: Vec<Record>,
    position: usize,
    exhausted: bool,
    fetch_as: FetchAs<T>,
}

impl<T: 'static> Rows<T> {
    pub fn new(stream: RowStream, fetch_as: FetchAs<T>) -> Self {
        Self {
            stream,
            cache: Vec::new(),
            position: 0,
            exhausted: false,
            fetch_as,
        }
    }

    /// Whether a row exists at the current position, fetching it if needed.
    pub async fn has_next(&mut self) -> OrmResult<bool> {
        while self.cache.len() <= self.position {
            if self.exhausted {
                return Ok(false);
            }
            match self.stream.next().await {
                Some(Ok(record)) => self.cache.push(record),
                Some(Err(err)) => {
                    self.exhausted = true;
                    return Err(err);
                }
                None => self.exhausted = true,
            }
        }
        Ok(true)
    }

    /// The row at the current position, mapped through the fetch strategy.
    ///
    /// Call [`Rows::has_next`] first; an unfetched position is an error.
    pub fn current(&self) -> OrmResult<T> {
        let record = self.current_record().ok_or_else(|| {
            OrmError::unexpected(format!("no row fetched at position {}", self.position))
        })?;
        self.fetch_as.map(record.clone())
    }

    /// The raw row at the current position, if fetched.
    pub fn current_record(&self) -> Option<&Record> {
        self.cache.get(self.position)
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Fetch, map and step past the next row.
    pub async fn next(&mut self) -> OrmResult<Option<T>> {
        if !self.has_next().await? {
            return Ok(None);
        }
        let value = self.current()?;
        self.advance();
        Ok(Some(value))
    }

    /// Total number of rows in the result set.
    ///
    /// Drains the remaining rows into the cache; the position is unchanged.
    /// The count is the one the driver reports for the exhausted result
    /// (the command tag for Postgres), falling back to the number of rows
    /// fetched for streams that report none.
    pub async fn row_count(&mut self) -> OrmResult<u64> {
        while !self.exhausted {
            match self.stream.next().await {
                Some(Ok(record)) => self.cache.push(record),
                Some(Err(err)) => {
                    self.exhausted = true;
                    return Err(err);
                }
                None => self.exhausted = true,
            }
        }
        Ok(self
            .stream
            .reported_count()
            .unwrap_or(self.cache.len() as u64))
    }

    /// Map every row, from the first, into a vector.
    pub async fn try_collect(mut self) -> OrmResult<Vec<T>> {
        self.rewind();
        let mut out = Vec::new();
        while let Some(value) = self.next().await? {
            out.push(value);
        }
        Ok(out)
    }
}

impl<T> fmt::Debug for Rows<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("fetched", &self.cache.len())
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .field("fetch_as", &self.fetch_as)
            .finish()
    }
}
