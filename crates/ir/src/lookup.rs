//! Label/name to API-name lookup
//!
//! `NameLookup` maps every field name and label, exactly as authored, to the
//! field's canonical API name. It is built once per schema and read-only
//! afterward.

use metaforge_core::CanonicalId;
use std::collections::HashMap;

use crate::field::FieldSpec;

/// Mapping from authored field names and labels to canonical API names
#[derive(Debug, Clone, Default)]
pub struct NameLookup {
    entries: HashMap<String, CanonicalId>,
}

impl NameLookup {
    /// Build the lookup from the draft's fields.
    ///
    /// Each field contributes its name and its label. When two fields share a
    /// key, the later field wins.
    pub fn from_fields(fields: &[FieldSpec]) -> Self {
        let mut entries = HashMap::with_capacity(fields.len() * 2);

        for field in fields {
            let api_name = field.api_name();
            let name = field.effective_name();
            if !name.is_empty() {
                entries.insert(name.to_string(), api_name.clone());
            }
            if let Some(label) = field.authored_label() {
                entries.insert(label.to_string(), api_name);
            }
        }

        Self { entries }
    }

    /// Exact (case-sensitive) lookup of an authored key
    pub fn get(&self, key: &str) -> Option<&CanonicalId> {
        self.entries.get(key)
    }

    /// Whether the key is known
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lookup has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys ordered longest first, ties broken alphabetically.
    ///
    /// This is the order formula substitution tries candidates in, so a
    /// longer label always wins over a shorter one it contains.
    pub fn keys_longest_first(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        keys
    }

    /// Iterate over `(key, api_name)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CanonicalId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_core::FieldType;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("Price", FieldType::Currency).with_label("Sale Price"),
            FieldSpec::new("Model Year", FieldType::Number),
        ]
    }

    #[test]
    fn test_lookup_has_names_and_labels() {
        let lookup = NameLookup::from_fields(&fields());
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.get("Price").unwrap().as_str(), "Price__c");
        assert_eq!(lookup.get("Sale Price").unwrap().as_str(), "Price__c");
        assert_eq!(lookup.get("Model Year").unwrap().as_str(), "Model_Year__c");
    }

    #[test]
    fn test_lookup_keys_are_case_sensitive() {
        let lookup = NameLookup::from_fields(&fields());
        assert!(lookup.contains("Price"));
        assert!(!lookup.contains("price"));
    }

    #[test]
    fn test_keys_longest_first() {
        let lookup = NameLookup::from_fields(&fields());
        assert_eq!(
            lookup.keys_longest_first(),
            vec!["Model Year", "Sale Price", "Price"]
        );
    }

    #[test]
    fn test_later_field_wins_on_shared_key() {
        let lookup = NameLookup::from_fields(&[
            FieldSpec::new("Amount", FieldType::Number).with_label("Total"),
            FieldSpec::new("Total", FieldType::Currency),
        ]);
        assert_eq!(lookup.get("Total").unwrap().as_str(), "Total__c");
    }
}
