//! Projection and document-path helpers for the in-memory store.
//!
//! Mirrors the service: only the listed paths come back, key attributes
//! included only when listed, and paths missing from the item are omitted.

use serde_json::{Map, Value};

use crate::record::Item;

/// Resolve a dot-separated path within an item.
pub fn resolve_path<'a>(item: &'a Item, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = item.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Keep only `paths` from `item`. An empty projection returns the whole item.
pub fn apply_projection(item: &Item, paths: &[String]) -> Item {
    if paths.is_empty() {
        return item.clone();
    }

    let mut result = Map::new();
    for path in paths {
        if let Some(value) = resolve_path(item, path) {
            set_path(&mut result, path, value.clone(), true);
        }
    }
    result
}

/// Set a value at a dot-separated path.
///
/// With `create_parents` missing intermediate maps are created; without it
/// the call fails when a parent is absent, as an update against a missing
/// document path does. Returns `false` if the value could not be placed.
pub fn set_path(target: &mut Item, path: &str, value: Value, create_parents: bool) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = target;
    for &segment in parents {
        if create_parents {
            current
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
        }
        match current.get_mut(segment) {
            Some(Value::Object(next)) => current = next,
            _ => return false,
        }
    }
    current.insert(last.to_string(), value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_empty_projection_returns_full_item() {
        let doc = item(json!({"year": 1990, "title": "a", "plot": "p"}));
        assert_eq!(apply_projection(&doc, &[]), doc);
    }

    #[test]
    fn test_nested_projection() {
        let doc = item(json!({
            "year": 2013,
            "title": "Rush",
            "info": {"rating": 8.3, "plot": "racing"}
        }));
        let result = apply_projection(&doc, &paths(&["year", "title", "info.rating"]));
        assert_eq!(
            Value::Object(result),
            json!({"year": 2013, "title": "Rush", "info": {"rating": 8.3}})
        );
    }

    #[test]
    fn test_missing_paths_omitted() {
        let doc = item(json!({"year": 1990, "title": "Example 3"}));
        let result = apply_projection(&doc, &paths(&["year", "title", "info.rating"]));
        assert_eq!(Value::Object(result), json!({"year": 1990, "title": "Example 3"}));
    }

    #[test]
    fn test_keys_not_added_implicitly() {
        let doc = item(json!({"year": 1990, "title": "Example 3", "plot": "p"}));
        let result = apply_projection(&doc, &paths(&["plot"]));
        assert_eq!(Value::Object(result), json!({"plot": "p"}));
    }

    #[test]
    fn test_set_path_without_parent_fails() {
        let mut doc = item(json!({"year": 1990}));
        assert!(!set_path(&mut doc, "info.rating", json!(5), false));
        assert!(set_path(&mut doc, "info.rating", json!(5), true));
        assert_eq!(doc["info"]["rating"], 5);
        assert!(set_path(&mut doc, "info.plot", json!("p"), false));
        assert_eq!(doc["info"]["plot"], "p");
    }

    #[test]
    fn test_set_path_through_scalar_fails() {
        let mut doc = item(json!({"info": 3}));
        assert!(!set_path(&mut doc, "info.rating", json!(5), true));
    }
}
