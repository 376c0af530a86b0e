//! Core types used throughout Metaforge
//!
//! Field types understood by the renderer, their metadata names, and the
//! defaults the platform expects for type-specific attributes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Field Types
// ============================================================================

/// Field types supported for custom fields
///
/// Parsing is case-insensitive and tolerates a few spellings models tend to
/// produce (`Long Text Area`, `Boolean`). Anything else is kept as
/// [`FieldType::Unknown`] so the draft still loads; rendering rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Single-line text (`length`)
    #[default]
    Text,
    /// Multi-line text up to 255 characters
    TextArea,
    /// Long multi-line text (`length`, `visibleLines`)
    LongTextArea,
    /// Numeric value (`precision`, `scale`)
    Number,
    /// Money value (`precision`, `scale`)
    Currency,
    /// Percentage (`precision`, `scale`)
    Percent,
    /// Boolean flag (`defaultValue`)
    Checkbox,
    /// Restricted single-select value set (`picklistValues`)
    Picklist,
    /// Calendar date
    Date,
    /// Date and time
    DateTime,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Web address
    Url,
    /// A type the renderer does not know
    Unknown(String),
}

impl FieldType {
    /// All known field types, in declaration order
    pub const KNOWN: [FieldType; 13] = [
        FieldType::Text,
        FieldType::TextArea,
        FieldType::LongTextArea,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Percent,
        FieldType::Checkbox,
        FieldType::Picklist,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Url,
    ];

    /// Metadata `<type>` value for this field type
    pub fn metadata_name(&self) -> &str {
        match self {
            FieldType::Text => "Text",
            FieldType::TextArea => "TextArea",
            FieldType::LongTextArea => "LongTextArea",
            FieldType::Number => "Number",
            FieldType::Currency => "Currency",
            FieldType::Percent => "Percent",
            FieldType::Checkbox => "Checkbox",
            FieldType::Picklist => "Picklist",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone",
            FieldType::Url => "Url",
            FieldType::Unknown(name) => name,
        }
    }

    /// Whether the renderer knows this type
    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Unknown(_))
    }

    /// Whether the type carries `precision` and `scale`
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Currency | FieldType::Percent
        )
    }

    /// Default `(precision, scale)` for numeric types
    pub fn default_precision_scale(&self) -> Option<(u32, u32)> {
        match self {
            FieldType::Number => Some((18, 0)),
            FieldType::Currency => Some((18, 2)),
            FieldType::Percent => Some((5, 2)),
            _ => None,
        }
    }

    /// Default `length` for text types that carry one
    pub fn default_length(&self) -> Option<u32> {
        match self {
            FieldType::Text => Some(100),
            FieldType::LongTextArea => Some(32768),
            _ => None,
        }
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        Ok(match key.as_str() {
            "text" | "string" => FieldType::Text,
            "textarea" => FieldType::TextArea,
            "longtextarea" | "longtext" => FieldType::LongTextArea,
            "number" | "integer" | "decimal" => FieldType::Number,
            "currency" => FieldType::Currency,
            "percent" | "percentage" => FieldType::Percent,
            "checkbox" | "boolean" => FieldType::Checkbox,
            "picklist" => FieldType::Picklist,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "email" => FieldType::Email,
            "phone" => FieldType::Phone,
            "url" => FieldType::Url,
            _ => FieldType::Unknown(s.trim().to_string()),
        })
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.metadata_name().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metadata_name())
    }
}

// ============================================================================
// Sharing Model
// ============================================================================

/// Organization-wide default for a custom object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SharingModel {
    Private,
    Read,
    #[default]
    ReadWrite,
}

impl SharingModel {
    /// Metadata `<sharingModel>` value
    pub fn metadata_name(&self) -> &'static str {
        match self {
            SharingModel::Private => "Private",
            SharingModel::Read => "Read",
            SharingModel::ReadWrite => "ReadWrite",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
