//! The Movie record model.
//!
//! A record is a JSON document keyed by `(year, title)`. Only the key
//! attributes are checked; everything else in the document is carried
//! through as-is, so bulk-loaded records keep their full `info` map.
//!
//! Numbers stay exact: `serde_json` is built with `arbitrary_precision`, so a
//! `Number` keeps the decimal text it was parsed from, and ratings are surfaced as
//! `rust_decimal::Decimal`.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{ClientError, Result};

/// Partition key attribute name.
pub const PARTITION_KEY: &str = "year";
/// Sort key attribute name.
pub const SORT_KEY: &str = "title";

/// A raw attribute map as stored in the table.
pub type Item = Map<String, Value>;

/// Composite primary key of a movie.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MovieKey {
    pub year: i64,
    pub title: String,
}

impl MovieKey {
    pub fn new(year: i64, title: impl Into<String>) -> Self {
        Self {
            year,
            title: title.into(),
        }
    }

    /// Extract the key attributes from an item.
    pub fn from_item(item: &Item) -> Result<Self> {
        let year = item
            .get(PARTITION_KEY)
            .ok_or_else(|| ClientError::InvalidRecord(format!("missing '{PARTITION_KEY}'")))?;
        let year = year.as_i64().ok_or_else(|| {
            ClientError::InvalidRecord(format!("'{PARTITION_KEY}' must be an integer, got {year}"))
        })?;

        let title = item
            .get(SORT_KEY)
            .ok_or_else(|| ClientError::InvalidRecord(format!("missing '{SORT_KEY}'")))?;
        let title = title.as_str().ok_or_else(|| {
            ClientError::InvalidRecord(format!("'{SORT_KEY}' must be a string, got {title}"))
        })?;
        if title.is_empty() {
            return Err(ClientError::InvalidRecord(format!(
                "'{SORT_KEY}' must not be empty"
            )));
        }

        Ok(Self::new(year, title))
    }

    /// The key as an item holding only the key attributes.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(PARTITION_KEY.to_string(), Value::from(self.year));
        item.insert(SORT_KEY.to_string(), Value::String(self.title.clone()));
        item
    }
}

impl fmt::Display for MovieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.year, self.title)
    }
}

/// A movie document with validated key attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    key: MovieKey,
    item: Item,
}

impl MovieRecord {
    /// A record holding only its key.
    pub fn new(key: MovieKey) -> Self {
        let item = key.to_item();
        Self { key, item }
    }

    /// Set an extra attribute. Key attributes cannot be replaced this way.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if name != PARTITION_KEY && name != SORT_KEY {
            self.item.insert(name, value);
        }
        self
    }

    pub fn key(&self) -> &MovieKey {
        &self.key
    }

    pub fn year(&self) -> i64 {
        self.key.year
    }

    pub fn title(&self) -> &str {
        &self.key.title
    }

    pub fn attributes(&self) -> &Item {
        &self.item
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.item.get(name)
    }

    pub fn into_item(self) -> Item {
        self.item
    }

    /// Top-level `rating`, written by updates.
    pub fn rating(&self) -> Option<Decimal> {
        self.item.get("rating").and_then(value_to_decimal)
    }

    /// Nested `info.rating`, present in bulk-loaded data.
    pub fn info_rating(&self) -> Option<Decimal> {
        self.item
            .get("info")
            .and_then(|info| info.get("rating"))
            .and_then(value_to_decimal)
    }

    /// The rating shown to users: `info.rating`, else the top-level `rating`.
    pub fn display_rating(&self) -> Option<Decimal> {
        self.info_rating().or_else(|| self.rating())
    }

    /// One-line summary: `{title} - {year} - {rating}`.
    pub fn summary_line(&self) -> String {
        let rating = self
            .display_rating()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        format!("{} - {} - {}", self.key.title, self.key.year, rating)
    }
}

impl TryFrom<Item> for MovieRecord {
    type Error = ClientError;

    fn try_from(item: Item) -> Result<Self> {
        let key = MovieKey::from_item(&item)?;
        Ok(Self { key, item })
    }
}

impl TryFrom<Value> for MovieRecord {
    type Error = ClientError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(item) => Self::try_from(item),
            other => Err(ClientError::InvalidRecord(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

impl Serialize for MovieRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.item.serialize(serializer)
    }
}

/// Attribute values applied by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieUpdate {
    pub rating: Decimal,
    pub plot: String,
    pub actors: String,
}

impl MovieUpdate {
    pub fn new(rating: Decimal, plot: impl Into<String>, actors: impl Into<String>) -> Self {
        Self {
            rating,
            plot: plot.into(),
            actors: actors.into(),
        }
    }

    /// `(attribute, value)` pairs in the order they are SET.
    pub fn assignments(&self) -> Result<Vec<(String, Value)>> {
        Ok(vec![
            ("rating".to_string(), decimal_to_value(&self.rating)?),
            ("plot".to_string(), Value::String(self.plot.clone())),
            ("actors".to_string(), Value::String(self.actors.clone())),
        ])
    }
}

/// Exact decimal → JSON number.
pub fn decimal_to_value(decimal: &Decimal) -> Result<Value> {
    parse_number(&decimal.normalize().to_string()).map(Value::Number)
}

/// Parse decimal text into a JSON number without going through `f64`.
pub fn parse_number(text: &str) -> Result<Number> {
    serde_json::from_str::<Number>(text)
        .map_err(|e| ClientError::InvalidRecord(format!("'{text}' is not a number: {e}")))
}

/// Read a number (or numeric string) as an exact decimal.
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
