//! Identifier normalization
//!
//! Converts free-form names and labels into canonical, platform-safe API
//! names. The derivation is pure and idempotent: normalizing an identifier
//! that is already canonical yields the same identifier.
//!
//! ```rust,ignore
//! use metaforge_core::naming::normalize;
//!
//! assert_eq!(normalize("Annual  Revenue").as_str(), "Annual_Revenue__c");
//! assert_eq!(normalize("Annual_Revenue__c").as_str(), "Annual_Revenue__c");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix carried by every custom object and custom field API name.
///
/// Matching is exact-case: `Foo__C` is not considered suffixed.
pub const CUSTOM_SUFFIX: &str = "__c";

// ============================================================================
// CanonicalId
// ============================================================================

/// A platform-safe identifier derived from a human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier and return the inner string
    pub fn into_string(self) -> String {
        self.0
    }

    /// The identifier with the custom suffix removed
    pub fn base_name(&self) -> &str {
        self.0.strip_suffix(CUSTOM_SUFFIX).unwrap_or(&self.0)
    }

    /// `Object.Field` path as used in field-level permissions
    pub fn qualify(&self, field: &CanonicalId) -> String {
        format!("{}.{}", self.0, field.0)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CanonicalId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CanonicalId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Derivation
// ============================================================================

/// Derive the canonical API name for a custom object or field.
///
/// Every run of whitespace becomes a single `_`, then [`CUSTOM_SUFFIX`] is
/// appended unless the result already ends with it.
pub fn normalize(name: &str) -> CanonicalId {
    let mut id = file_stem(name);
    if !has_custom_suffix(&id) {
        id.push_str(CUSTOM_SUFFIX);
    }
    CanonicalId(id)
}

/// Replace every run of whitespace with a single underscore.
///
/// Used on its own for metadata that carries no suffix (profiles,
/// permission sets, validation rules).
pub fn file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + CUSTOM_SUFFIX.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }

    out
}

/// Characters that may not appear in a metadata file name
const FORBIDDEN_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Whether a file stem can be used as a single file name component: not
/// empty, no path separators or `..`, no leading `.`, no control characters.
pub fn is_safe_file_stem(stem: &str) -> bool {
    !stem.is_empty()
        && !stem.starts_with('.')
        && !stem.contains("..")
        && !stem
            .chars()
            .any(|c| c.is_control() || FORBIDDEN_FILE_CHARS.contains(&c))
}

/// Whether `name` already ends with the exact-case custom suffix
pub fn has_custom_suffix(name: &str) -> bool {
    name.ends_with(CUSTOM_SUFFIX)
}

/// Append the custom suffix to `name` (no whitespace handling).
pub fn with_suffix(name: &str) -> String {
    format!("{name}{CUSTOM_SUFFIX}")
}

// ============================================================================
// Tests
// ============================================================================
