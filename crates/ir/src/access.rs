//! Access rules and validation rules of the draft
//!
//! Profiles, permission sets and validation rules all point back at fields
//! by label or name. Those references are kept verbatim here and resolved
//! later by [`crate::resolve::Resolver`].

use serde::{Deserialize, Serialize};

use crate::lenient;

// ============================================================================
// ObjectPermissions
// ============================================================================

/// CRUD permissions on the custom object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPermissions {
    /// Target object (permission sets only; profiles imply the schema object)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub allow_create: Option<bool>,

    #[serde(default, deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub allow_delete: Option<bool>,

    #[serde(default, deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub allow_edit: Option<bool>,

    #[serde(default, deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub allow_read: Option<bool>,

    #[serde(default, deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub modify_all_records: Option<bool>,

    #[serde(default, deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub view_all_records: Option<bool>,
}

impl ObjectPermissions {
    /// Grant read/create/edit, no delete
    pub fn read_write() -> Self {
        Self {
            allow_read: Some(true),
            allow_create: Some(true),
            allow_edit: Some(true),
            allow_delete: Some(false),
            ..Default::default()
        }
    }

    /// Set the target object
    pub fn for_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Permissions that were explicitly set, as `(element, value)` pairs in
    /// metadata element order. `object` is not included.
    pub fn entries(&self) -> Vec<(&'static str, bool)> {
        [
            ("allowCreate", self.allow_create),
            ("allowDelete", self.allow_delete),
            ("allowEdit", self.allow_edit),
            ("allowRead", self.allow_read),
            ("modifyAllRecords", self.modify_all_records),
            ("viewAllRecords", self.view_all_records),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }

    /// Whether no permission was set at all
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Field-level security entry of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAccess {
    /// Field label or name as written by the model
    #[serde(default)]
    pub field: String,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub readable: bool,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub editable: bool,
}

impl FieldAccess {
    pub fn new(field: impl Into<String>, readable: bool, editable: bool) -> Self {
        Self {
            field: field.into(),
            readable,
            editable,
        }
    }
}

/// A system or user permission toggled on a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermission {
    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub enabled: bool,
}

/// Access configuration for one profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAccess {
    /// Profile name (e.g. "Standard User")
    #[serde(default)]
    pub profile: String,

    /// CRUD permissions on the schema object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_permissions: Option<ObjectPermissions>,

    /// Field-level security entries
    #[serde(default, deserialize_with = "lenient::list")]
    pub fields: Vec<FieldAccess>,

    /// User permissions
    #[serde(
        default,
        deserialize_with = "lenient::list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub user_permissions: Vec<UserPermission>,
}

impl ProfileAccess {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Default::default()
        }
    }

    /// Add a field-level security entry
    pub fn with_field(mut self, field: impl Into<String>, readable: bool, editable: bool) -> Self {
        self.fields.push(FieldAccess::new(field, readable, editable));
        self
    }
}

// ============================================================================
// Permission Sets
// ============================================================================

/// Field permission entry of a permission set (`Object.Field` path)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    #[serde(default)]
    pub field: String,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub readable: bool,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub editable: bool,
}

/// A permission set granting access to the schema object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSetSpec {
    /// Developer name of the permission set
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_permissions: Option<ObjectPermissions>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub field_permissions: Vec<FieldPermission>,
}

impl PermissionSetSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a field permission
    pub fn with_field(mut self, path: impl Into<String>, readable: bool, editable: bool) -> Self {
        self.field_permissions.push(FieldPermission {
            field: path.into(),
            readable,
            editable,
        });
        self
    }
}

// ============================================================================
// Validation Rules
// ============================================================================

/// A validation rule on the schema object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRuleSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Formula that evaluates to true when the record is invalid
    #[serde(default)]
    pub error_condition_formula: String,

    #[serde(default)]
    pub error_message: String,

    #[serde(default = "default_active", deserialize_with = "active_flag")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn active_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient::opt_flag(deserializer).map(|v| v.unwrap_or(true))
}

impl ValidationRuleSpec {
    pub fn new(
        name: impl Into<String>,
        formula: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            error_condition_formula: formula.into(),
            error_message: error_message.into(),
            active: true,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
