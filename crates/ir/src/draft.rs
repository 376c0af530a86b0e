//! The untrusted schema draft
//!
//! A `SchemaDraft` is the structured output of prompt parsing. Nothing in it
//! is trusted: it is checked by [`crate::validation::validate_draft`] and
//! only then normalized into a [`crate::FinalSchema`].

use metaforge_core::{ForgeResult, Validatable};
use serde::{Deserialize, Serialize};

use crate::access::{PermissionSetSpec, ProfileAccess, ValidationRuleSpec};
use crate::field::FieldSpec;
use crate::lenient;

/// Schema draft as produced by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDraft {
    /// Object name (required)
    #[serde(default)]
    pub object: Option<String>,

    /// Plural label override (defaults to the object name plus "s")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_label: Option<String>,

    /// Object description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered field list (required, may be empty)
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub profile_access: Vec<ProfileAccess>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub permission_sets: Vec<PermissionSetSpec>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub validation_rules: Vec<ValidationRuleSpec>,
}

impl SchemaDraft {
    /// Create a draft for the given object with no fields
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: Some(object.into()),
            fields: Some(Vec::new()),
            ..Default::default()
        }
    }

    /// Parse a draft from a JSON document
    pub fn from_json(json: &str) -> ForgeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the draft as pretty JSON
    pub fn to_json(&self) -> ForgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Append a field
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.get_or_insert_with(Vec::new).push(field);
        self
    }

    /// Append a profile access entry
    pub fn with_profile(mut self, access: ProfileAccess) -> Self {
        self.profile_access.push(access);
        self
    }

    /// Append a permission set
    pub fn with_permission_set(mut self, set: PermissionSetSpec) -> Self {
        self.permission_sets.push(set);
        self
    }

    /// Append a validation rule
    pub fn with_validation_rule(mut self, rule: ValidationRuleSpec) -> Self {
        self.validation_rules.push(rule);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Object name if present and not blank
    pub fn object_name(&self) -> Option<&str> {
        self.object.as_deref().filter(|o| !o.trim().is_empty())
    }

    /// Fields (empty when the attribute is missing)
    pub fn field_list(&self) -> &[FieldSpec] {
        self.fields.as_deref().unwrap_or_default()
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.field_list().len()
    }
}

impl Validatable for SchemaDraft {
    fn validate(&self) -> ForgeResult<()> {
        crate::validation::validate_draft(self).to_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_core::FieldType;

    #[test]
    fn test_draft_from_model_json() {
        let draft = SchemaDraft::from_json(
            r#"{
                "object": "Car",
                "fields": [
                    {"name": "Name", "type": "Text"},
                    {"name": "Price", "type": "Currency"}
                ],
                "profileAccess": null
            }"#,
        )
        .unwrap();

        assert_eq!(draft.object_name(), Some("Car"));
        assert_eq!(draft.field_count(), 2);
        assert_eq!(draft.field_list()[1].field_type, FieldType::Currency);
        assert!(draft.profile_access.is_empty());
        assert!(draft.validation_rules.is_empty());
    }

    #[test]
    fn test_missing_object_and_fields() {
        let draft = SchemaDraft::from_json("{}").unwrap();
        assert_eq!(draft.object_name(), None);
        assert!(draft.fields.is_none());
        assert!(!draft.is_valid());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = SchemaDraft::from_json("{\"object\": ").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_builder() {
        let draft = SchemaDraft::new("Car").with_field(FieldSpec::new("Price", FieldType::Currency));
        assert_eq!(draft.field_count(), 1);
        assert!(draft.is_valid());
    }
}
