use ragwire_core::RagwireError;
use serde_json::{Map, Value};

use crate::config::is_identifier;

/// Equality conditions on document metadata, combined with `AND`.
///
/// Keys may be dotted paths (`source.page`); each segment must be a plain identifier.
/// Values are always sent as bound query variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Vec<(String, Value)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `metadata.<key> = value`.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Render as a ` WHERE ...` clause (empty when there are no conditions),
    /// inserting one `$fN` variable per condition into `vars`.
    pub(crate) fn render(&self, vars: &mut Map<String, Value>) -> Result<String, RagwireError> {
        if self.conditions.is_empty() {
            return Ok(String::new());
        }
        let mut clauses = Vec::with_capacity(self.conditions.len());
        for (i, (key, value)) in self.conditions.iter().enumerate() {
            if key.is_empty() || !key.split('.').all(is_identifier) {
                return Err(RagwireError::Validation(format!(
                    "invalid metadata filter key: {key:?}"
                )));
            }
            let var = format!("f{i}");
            clauses.push(format!("metadata.{key} = ${var}"));
            vars.insert(var, value.clone());
        }
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_renders_nothing() {
        let mut vars = Map::new();
        assert_eq!(MetadataFilter::new().render(&mut vars).unwrap(), "");
        assert!(vars.is_empty());
    }

    #[test]
    fn conditions_are_joined_with_and() {
        let filter = MetadataFilter::new()
            .eq("source", "wiki")
            .eq("meta.page", 3);
        let mut vars = Map::new();
        let clause = filter.render(&mut vars).unwrap();
        assert_eq!(clause, " WHERE metadata.source = $f0 AND metadata.meta.page = $f1");
        assert_eq!(vars["f0"], json!("wiki"));
        assert_eq!(vars["f1"], json!(3));
    }

    #[test]
    fn rejects_injection_in_keys() {
        let filter = MetadataFilter::new().eq("a = 1 OR true", "x");
        let err = filter.render(&mut Map::new()).unwrap_err();
        assert!(matches!(err, RagwireError::Validation(_)));

        assert!(MetadataFilter::new()
            .eq("a..b", 1)
            .render(&mut Map::new())
            .is_err());
    }
}
