//! # Metaforge IR (Intermediate Representation)
//!
//! This crate holds the data model between prompt parsing and rendering.
//!
//! ## Core Concepts
//!
//! - **SchemaDraft**: the untrusted structured output of the model
//! - **FieldSpec**: one field of the draft (name, label, type, attributes)
//! - **NameLookup**: authored names and labels mapped to API names
//! - **Resolver**: rewrites field references and formulas to API names
//! - **FinalSchema**: the validated, resolved schema ready for rendering
//!

pub mod access;
pub mod draft;
pub mod field;
mod lenient;
pub mod lookup;
pub mod resolve;
pub mod schema;
pub mod serialization;
pub mod validation;

pub use access::{
    FieldAccess, FieldPermission, ObjectPermissions, PermissionSetSpec, ProfileAccess,
    UserPermission, ValidationRuleSpec,
};
pub use draft::SchemaDraft;
pub use field::{DefaultValue, FieldSpec};
pub use lookup::NameLookup;
pub use resolve::{MatchKind, ReferenceMapping, Resolver, resolve, resolve_with_kind};
pub use schema::{
    FinalSchema, ObjectSpec, ResolvedField, ResolvedFieldPermission, ResolvedObjectPermissions,
    ResolvedPermissionSet, ResolvedProfile, ResolvedValidationRule,
};
pub use serialization::{DraftFile, load_draft, load_draft_from_string, save_draft};
pub use validation::{ValidationResult, Validator, validate_draft};

// Re-export core types that are commonly used with IR
pub use metaforge_core::{
    CanonicalId, FieldType, ForgeError, ForgeResult, SharingModel, Validatable, normalize,
};

/// Current schema version for draft files
pub const SCHEMA_VERSION: u32 = 1;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::{
        CanonicalId, FieldSpec, FieldType, FinalSchema, ForgeError, ForgeResult, PermissionSetSpec,
        ProfileAccess, SchemaDraft, Validatable, ValidationRuleSpec, normalize, resolve,
    };
}
