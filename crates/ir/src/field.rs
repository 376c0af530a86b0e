//! Field definitions for the custom object
//!
//! This module contains the `FieldSpec` struct, one attribute definition of
//! the schema draft, and the `DefaultValue` it may carry.

use heck::ToTitleCase;
use metaforge_core::{CanonicalId, FieldType, ForgeError, ForgeResult, Validatable, normalize};
use serde::{Deserialize, Serialize};

use crate::lenient;

// ============================================================================
// FieldSpec
// ============================================================================

/// A single custom field as described by the draft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Field name as authored (may contain spaces)
    #[serde(default)]
    pub name: String,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Field type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Maximum length (Text, LongTextArea)
    #[serde(
        default,
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub length: Option<u32>,

    /// Total digits (Number, Currency, Percent)
    #[serde(
        default,
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub precision: Option<u32>,

    /// Digits after the decimal point (Number, Currency, Percent)
    #[serde(
        default,
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub scale: Option<u32>,

    /// Visible lines in the editor (LongTextArea)
    #[serde(
        default,
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub visible_lines: Option<u32>,

    /// Default value (Checkbox)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,

    /// Values of a restricted picklist
    #[serde(
        default,
        deserialize_with = "lenient::list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub picklist_values: Vec<String>,

    /// Whether a value is required on save
    #[serde(default, deserialize_with = "lenient::flag")]
    pub required: bool,

    /// Description stored with the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Inline help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl FieldSpec {
    /// Create a new field with the given name and type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the length
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set precision and scale
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default_value = Some(default);
        self
    }

    /// Set the picklist values
    pub fn with_picklist<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.picklist_values = values.into_iter().map(Into::into).collect();
        self
    }

    // ========================================================================
    // Utility methods
    // ========================================================================

    /// The label, if the draft gave a non-blank one
    pub fn authored_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.trim().is_empty())
    }

    /// Name used to derive the API name.
    ///
    /// Falls back to the label when the model left the name blank.
    pub fn effective_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.authored_label().unwrap_or(&self.name)
        } else {
            &self.name
        }
    }

    /// Canonical API name of this field
    pub fn api_name(&self) -> CanonicalId {
        normalize(self.effective_name())
    }

    /// Label to render (falls back to a title-cased name)
    pub fn display_label(&self) -> String {
        match self.authored_label() {
            Some(label) => label.to_string(),
            None => self.effective_name().to_title_case(),
        }
    }
}

impl Validatable for FieldSpec {
    fn validate(&self) -> ForgeResult<()> {
        if self.effective_name().trim().is_empty() {
            return Err(ForgeError::validation("Field name cannot be empty"));
        }

        if let (Some(precision), Some(scale)) = (self.precision, self.scale) {
            if scale > precision {
                return Err(ForgeError::validation(format!(
                    "Field '{}' has scale {} greater than precision {}",
                    self.effective_name(),
                    scale,
                    precision
                )));
            }
        }

        if self.field_type == FieldType::Text {
            if let Some(length) = self.length {
                if length == 0 || length > 255 {
                    return Err(ForgeError::validation(format!(
                        "Field '{}' has text length {} outside 1..=255",
                        self.effective_name(),
                        length
                    )));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// DefaultValue
// ============================================================================

/// Default value attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl DefaultValue {
    /// Interpret the value as a checkbox default
    pub fn as_bool(&self) -> bool {
        match self {
            DefaultValue::Bool(v) => *v,
            DefaultValue::Number(v) => *v != 0.0,
            DefaultValue::Text(v) => v.trim().eq_ignore_ascii_case("true"),
        }
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Bool(v) => write!(f, "{}", v),
            DefaultValue::Number(v) => write!(f, "{}", v),
            DefaultValue::Text(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
