//! The normalized, reference-resolved schema
//!
//! [`FinalSchema::from_draft`] validates a [`SchemaDraft`], derives every API
//! name, and resolves all field references of profiles, permission sets and
//! validation formulas. The result is what the renderer consumes.

use metaforge_core::{CanonicalId, ForgeResult, SharingModel, file_stem, normalize};
use serde::Serialize;

use crate::access::{ObjectPermissions, UserPermission};
use crate::draft::SchemaDraft;
use crate::field::FieldSpec;
use crate::resolve::{ReferenceMapping, Resolver};
use crate::validation::validate_draft;

// ============================================================================
// Object
// ============================================================================

/// The custom object itself
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSpec {
    /// Name as authored
    pub name: String,
    pub api_name: CanonicalId,
    pub label: String,
    pub plural_label: String,
    /// Label of the standard name field
    pub name_field_label: String,
    pub sharing_model: SharingModel,
    pub description: Option<String>,
}

impl ObjectSpec {
    fn from_draft(name: &str, draft: &SchemaDraft) -> Self {
        let plural_label = draft
            .plural_label
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map_or_else(|| format!("{}s", name), str::to_string);

        Self {
            name: name.to_string(),
            api_name: normalize(name),
            label: name.to_string(),
            plural_label,
            name_field_label: format!("{} Name", name),
            sharing_model: SharingModel::default(),
            description: draft.description.clone(),
        }
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A field with its derived API name and label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub spec: FieldSpec,
    pub api_name: CanonicalId,
    pub label: String,
}

impl ResolvedField {
    fn from_spec(spec: &FieldSpec) -> Self {
        Self {
            api_name: spec.api_name(),
            label: spec.display_label(),
            spec: spec.clone(),
        }
    }
}

/// Resolved field-level permission (`Object__c.Field__c`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFieldPermission {
    pub field: String,
    pub readable: bool,
    pub editable: bool,
}

impl ResolvedFieldPermission {
    fn new(object: &CanonicalId, field: &CanonicalId, readable: bool, editable: bool) -> Self {
        Self {
            field: object.qualify(field),
            // An editable field is always readable
            readable: readable || editable,
            editable,
        }
    }
}

/// Resolved object permissions (target object plus flags)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedObjectPermissions {
    pub object: CanonicalId,
    pub permissions: ObjectPermissions,
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProfile {
    /// Profile name as authored
    pub name: String,
    /// File name stem of the profile artifact
    pub file_stem: String,
    pub object_permissions: Option<ResolvedObjectPermissions>,
    pub field_permissions: Vec<ResolvedFieldPermission>,
    pub user_permissions: Vec<UserPermission>,
}

// ============================================================================
// Permission Sets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPermissionSet {
    pub name: String,
    pub file_stem: String,
    pub label: String,
    pub description: Option<String>,
    pub object_permissions: Option<ResolvedObjectPermissions>,
    pub field_permissions: Vec<ResolvedFieldPermission>,
}

// ============================================================================
// Validation Rules
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValidationRule {
    pub name: String,
    pub file_stem: String,
    pub description: Option<String>,
    /// Formula with field references rewritten to API names
    pub formula: String,
    pub error_message: String,
    pub active: bool,
}

// ============================================================================
// FinalSchema
// ============================================================================

/// Schema ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSchema {
    pub object: ObjectSpec,
    pub fields: Vec<ResolvedField>,
    pub profiles: Vec<ResolvedProfile>,
    pub permission_sets: Vec<ResolvedPermissionSet>,
    pub validation_rules: Vec<ResolvedValidationRule>,
    /// Every reference mapping made while resolving, in order
    pub mappings: Vec<ReferenceMapping>,
}

impl FinalSchema {
    /// Validate and normalize a draft.
    ///
    /// Fails with a validation error if the draft is missing required
    /// attributes. Reference resolution itself never fails; unmatched
    /// references are logged and kept as derived ids.
    pub fn from_draft(draft: &SchemaDraft) -> ForgeResult<Self> {
        let report = validate_draft(draft);
        for warning in &report.warnings {
            tracing::warn!("{}", warning);
        }
        report.to_result()?;

        let object_name = draft
            .object_name()
            .ok_or_else(|| metaforge_core::ForgeError::internal("validated draft has no object"))?;
        let field_specs = draft.field_list();

        let object = ObjectSpec::from_draft(object_name, draft);
        let fields: Vec<ResolvedField> = field_specs.iter().map(ResolvedField::from_spec).collect();

        let mut resolver = Resolver::new(object_name, field_specs);
        let object_id = resolver.object_id().clone();

        let profiles = draft
            .profile_access
            .iter()
            .map(|access| {
                let context = format!("profile '{}'", access.profile);
                let field_permissions = access
                    .fields
                    .iter()
                    .map(|fls| {
                        let field = resolver.resolve_field(&context, &fls.field);
                        ResolvedFieldPermission::new(&object_id, &field, fls.readable, fls.editable)
                    })
                    .collect();

                let object_permissions = access
                    .object_permissions
                    .as_ref()
                    .filter(|p| !p.is_empty())
                    .map(|p| ResolvedObjectPermissions {
                        object: resolver.resolve_object(&context, p.object.as_deref()),
                        permissions: p.clone(),
                    });

                ResolvedProfile {
                    name: access.profile.clone(),
                    file_stem: file_stem(&access.profile),
                    object_permissions,
                    field_permissions,
                    user_permissions: access.user_permissions.clone(),
                }
            })
            .collect();

        let permission_sets = draft
            .permission_sets
            .iter()
            .map(|set| {
                let context = format!("permission set '{}'", set.name);
                let field_permissions = set
                    .field_permissions
                    .iter()
                    .map(|perm| {
                        let (object, field) = resolver.resolve_field_path(&context, &perm.field);
                        ResolvedFieldPermission::new(&object, &field, perm.readable, perm.editable)
                    })
                    .collect();

                let object_permissions = set
                    .object_permissions
                    .as_ref()
                    .filter(|p| !p.is_empty())
                    .map(|p| ResolvedObjectPermissions {
                        object: resolver.resolve_object(&context, p.object.as_deref()),
                        permissions: p.clone(),
                    });

                ResolvedPermissionSet {
                    name: set.name.clone(),
                    file_stem: file_stem(&set.name),
                    label: set
                        .label
                        .clone()
                        .filter(|l| !l.trim().is_empty())
                        .unwrap_or_else(|| set.name.clone()),
                    description: set.description.clone(),
                    object_permissions,
                    field_permissions,
                }
            })
            .collect();

        let validation_rules = draft
            .validation_rules
            .iter()
            .map(|rule| {
                let context = format!("validation rule '{}'", rule.name);
                ResolvedValidationRule {
                    name: rule.name.clone(),
                    file_stem: file_stem(&rule.name),
                    description: rule.description.clone(),
                    formula: resolver.rewrite_formula(&context, &rule.error_condition_formula),
                    error_message: rule.error_message.clone(),
                    active: rule.active,
                }
            })
            .collect();

        let mappings = resolver.into_mappings();
        tracing::debug!(
            object = %object.api_name,
            fields = fields.len(),
            mappings = mappings.len(),
            "normalized schema"
        );

        Ok(Self {
            object,
            fields,
            profiles,
            permission_sets,
            validation_rules,
            mappings,
        })
    }

    /// Look up a field by API name
    pub fn field(&self, api_name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.api_name.as_str() == api_name)
    }

    /// Mappings that fell back to a derived id
    pub fn unresolved(&self) -> impl Iterator<Item = &ReferenceMapping> {
        self.mappings
            .iter()
            .filter(|m| m.kind == crate::resolve::MatchKind::Fallback)
    }

    /// Summary message for the caller
    pub fn summary(&self) -> String {
        let mut message = format!(
            "Created object {} with {} fields",
            self.object.name,
            self.fields.len()
        );
        if !self.profiles.is_empty() {
            message.push_str(&format!(
                " with {} profile(s) configured",
                self.profiles.len()
            ));
        }
        message.push('.');
        message
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{PermissionSetSpec, ProfileAccess, ValidationRuleSpec};
    use metaforge_core::FieldType;
    use pretty_assertions::assert_eq;

    fn car() -> SchemaDraft {
        SchemaDraft::new("Car")
            .with_field(FieldSpec::new("Name", FieldType::Text))
            .with_field(FieldSpec::new("Price", FieldType::Currency).with_label("Sale Price"))
    }

    #[test]
    fn test_object_defaults() {
        let schema = FinalSchema::from_draft(&car()).unwrap();
        assert_eq!(schema.object.api_name.as_str(), "Car__c");
        assert_eq!(schema.object.plural_label, "Cars");
        assert_eq!(schema.object.name_field_label, "Car Name");
        assert_eq!(schema.object.sharing_model, SharingModel::ReadWrite);
    }

    #[test]
    fn test_field_api_names() {
        let schema = FinalSchema::from_draft(&car()).unwrap();
        let names: Vec<&str> = schema.fields.iter().map(|f| f.api_name.as_str()).collect();
        assert_eq!(names, vec!["Name__c", "Price__c"]);
        assert_eq!(schema.fields[1].label, "Sale Price");
        assert!(schema.field("Price__c").is_some());
    }

    #[test]
    fn test_missing_object_fails() {
        let mut draft = car();
        draft.object = None;
        let err = FinalSchema::from_draft(&draft).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_profile_field_permissions_are_qualified() {
        let draft = car().with_profile(
            ProfileAccess::new("Standard User")
                .with_field("sale price", true, false)
                .with_field("Name", false, true),
        );
        let schema = FinalSchema::from_draft(&draft).unwrap();
        let profile = &schema.profiles[0];

        assert_eq!(profile.file_stem, "Standard_User");
        assert_eq!(
            profile.field_permissions,
            vec![
                ResolvedFieldPermission {
                    field: "Car__c.Price__c".to_string(),
                    readable: true,
                    editable: false,
                },
                ResolvedFieldPermission {
                    field: "Car__c.Name__c".to_string(),
                    readable: true,
                    editable: true,
                },
            ]
        );
    }

    #[test]
    fn test_permission_set_paths_resolve_both_parts() {
        let mut set = PermissionSetSpec::new("Car Editors").with_field("car.Sale Price", true, true);
        set.object_permissions = Some(ObjectPermissions::read_write().for_object("Car"));
        let schema = FinalSchema::from_draft(&car().with_permission_set(set)).unwrap();
        let set = &schema.permission_sets[0];

        assert_eq!(set.file_stem, "Car_Editors");
        assert_eq!(set.label, "Car Editors");
        assert_eq!(set.field_permissions[0].field, "Car__c.Price__c");
        assert_eq!(
            set.object_permissions.as_ref().unwrap().object.as_str(),
            "Car__c"
        );
    }

    #[test]
    fn test_validation_formula_is_rewritten() {
        let draft = car().with_validation_rule(ValidationRuleSpec::new(
            "Price Positive",
            "Sale Price < 0",
            "Price must be positive",
        ));
        let schema = FinalSchema::from_draft(&draft).unwrap();
        let rule = &schema.validation_rules[0];

        assert_eq!(rule.file_stem, "Price_Positive");
        assert_eq!(rule.formula, "Price__c < 0");
        assert!(rule.active);
    }

    #[test]
    fn test_unresolved_reference_falls_back() {
        let draft = car().with_profile(ProfileAccess::new("Standard User").with_field("Mileage", true, false));
        let schema = FinalSchema::from_draft(&draft).unwrap();

        assert_eq!(schema.profiles[0].field_permissions[0].field, "Car__c.Mileage__c");
        assert_eq!(schema.unresolved().count(), 1);
    }

    #[test]
    fn test_summary_message() {
        let schema = FinalSchema::from_draft(&car()).unwrap();
        assert_eq!(schema.summary(), "Created object Car with 2 fields.");

        let draft = car().with_profile(ProfileAccess::new("Standard User").with_field("Name", true, false));
        let schema = FinalSchema::from_draft(&draft).unwrap();
        assert_eq!(
            schema.summary(),
            "Created object Car with 2 fields with 1 profile(s) configured."
        );
    }

    #[test]
    fn test_profile_name_with_parent_dirs_fails() {
        let draft = car().with_profile(ProfileAccess::new("../../../../../../escaped"));
        let err = FinalSchema::from_draft(&draft).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("cannot be used as a file name"));
    }
}
