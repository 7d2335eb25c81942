//! Conversion between JSON documents and DynamoDB attribute values.
//!
//! Numbers travel as their decimal text in both directions (`N` values are
//! strings on the wire), so nothing is rounded through `f64`.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::record::{Item, MovieKey, PARTITION_KEY, SORT_KEY, parse_number};

/// A DynamoDB item as the SDK represents it.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// Convert one JSON value.
pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(to_attribute_map(map)),
    }
}

/// Convert a JSON object into an SDK item.
pub fn to_attribute_map(item: &Item) -> AttributeMap {
    item.iter()
        .map(|(name, value)| (name.clone(), to_attribute_value(value)))
        .collect()
}

/// Convert one attribute value back to JSON.
///
/// String and number sets become arrays. Binary attributes are rejected.
pub fn from_attribute_value(attr: &AttributeValue) -> Result<Value> {
    let value = match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(from_attribute_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::M(map) => Value::Object(from_attribute_map(map)?),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<Vec<_>>>()?,
        ),
        other => {
            return Err(ClientError::InvalidRecord(format!(
                "unsupported attribute type: {other:?}"
            )));
        }
    };
    Ok(value)
}

/// Convert an SDK item into a JSON object.
pub fn from_attribute_map(map: &AttributeMap) -> Result<Item> {
    map.iter()
        .map(|(name, attr)| Ok((name.clone(), from_attribute_value(attr)?)))
        .collect()
}

/// The key attributes for a get/update/exclusive-start-key.
pub fn key_attributes(key: &MovieKey) -> AttributeMap {
    HashMap::from([
        (
            PARTITION_KEY.to_string(),
            AttributeValue::N(key.year.to_string()),
        ),
        (SORT_KEY.to_string(), AttributeValue::S(key.title.clone())),
    ])
}

/// Read a `LastEvaluatedKey` back into a `MovieKey`.
pub fn key_from_attributes(map: &AttributeMap) -> Result<MovieKey> {
    MovieKey::from_item(&from_attribute_map(map)?)
}
