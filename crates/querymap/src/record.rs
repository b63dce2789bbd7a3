//! Raw rows as ordered column/value pairs.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// A fetched row: column names paired with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A repeated name shadows nothing; `get` returns the first match.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((column.into(), value.into()));
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Like [`Record::get`], but a missing column is a decode error.
    pub fn try_get(&self, column: &str) -> OrmResult<&Value> {
        self.get(column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of the first column, if any.
    pub fn first_value(&self) -> Option<&Value> {
        self.fields.first().map(|(_, value)| value)
    }

    /// Convert into a JSON object keyed by column name.
    pub fn into_json(self) -> serde_json::Value {
        let map = self
            .fields
            .into_iter()
            .map(|(name, value)| (name, value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Build a user type from a fetched [`Record`].
///
/// Used with [`FetchAs::of`](crate::cursor::FetchAs::of).
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> OrmResult<Self>;
}
