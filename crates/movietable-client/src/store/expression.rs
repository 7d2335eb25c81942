//! Placeholder bookkeeping for DynamoDB expressions.
//!
//! Every attribute name goes through an `#nN` placeholder (`year` is a
//! reserved word) and every value through a `:vN` placeholder.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::store::YearRange;

#[derive(Debug, Default)]
pub struct Expression {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    name_order: Vec<String>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for one attribute name. Repeated names share a placeholder.
    pub fn name(&mut self, attr: &str) -> String {
        if let Some(pos) = self.name_order.iter().position(|n| n == attr) {
            return format!("#n{pos}");
        }
        let placeholder = format!("#n{}", self.name_order.len());
        self.name_order.push(attr.to_string());
        self.names.insert(placeholder.clone(), attr.to_string());
        placeholder
    }

    /// Placeholder path for a dot-separated document path (`info.rating`).
    pub fn path(&mut self, path: &str) -> String {
        path.split('.')
            .map(|segment| self.name(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Placeholder for one value.
    pub fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// `#p BETWEEN :lo AND :hi` on a numeric attribute.
    pub fn between(&mut self, attr: &str, range: YearRange) -> String {
        let name = self.name(attr);
        let lo = self.value(AttributeValue::N(range.start.to_string()));
        let hi = self.value(AttributeValue::N(range.end.to_string()));
        format!("{name} BETWEEN {lo} AND {hi}")
    }

    /// Comma-separated projection over dot-separated paths.
    pub fn projection(&mut self, paths: &[String]) -> Option<String> {
        if paths.is_empty() {
            return None;
        }
        Some(
            paths
                .iter()
                .map(|p| self.path(p))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Name and value maps for the request builder. DynamoDB rejects empty
    /// maps, so empty ones come back as `None`.
    pub fn into_parts(
        self,
    ) -> (
        Option<HashMap<String, String>>,
        Option<HashMap<String, AttributeValue>>,
    ) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then_some(self.values);
        (names, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_shared() {
        let mut expr = Expression::new();
        assert_eq!(expr.name("year"), "#n0");
        assert_eq!(expr.name("title"), "#n1");
        assert_eq!(expr.name("year"), "#n0");
        let (names, values) = expr.into_parts();
        let names = names.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names["#n1"], "title");
        assert!(values.is_none());
    }

    #[test]
    fn test_between_filter() {
        let mut expr = Expression::new();
        let filter = expr.between("year", YearRange::new(1990, 2000));
        assert_eq!(filter, "#n0 BETWEEN :v0 AND :v1");
        let (_, values) = expr.into_parts();
        let values = values.unwrap();
        assert_eq!(values[":v0"], AttributeValue::N("1990".into()));
        assert_eq!(values[":v1"], AttributeValue::N("2000".into()));
    }

    #[test]
    fn test_projection_with_nested_path() {
        let mut expr = Expression::new();
        let paths = vec![
            "year".to_string(),
            "title".to_string(),
            "info.rating".to_string(),
        ];
        assert_eq!(
            expr.projection(&paths).unwrap(),
            "#n0, #n1, #n2.#n3"
        );
        let (names, _) = expr.into_parts();
        let names = names.unwrap();
        assert_eq!(names["#n2"], "info");
        assert_eq!(names["#n3"], "rating");
    }

    #[test]
    fn test_empty_projection() {
        let mut expr = Expression::new();
        assert_eq!(expr.projection(&[]), None);
        assert_eq!(expr.into_parts(), (None, None));
    }
}
