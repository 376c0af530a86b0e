//! # Metaforge Core
//!
//! Core types, identifier normalization and error handling for Metaforge.
//!
//! This crate provides the foundational building blocks used by every other
//! crate in the workspace:
//!
//! - **Naming**: canonical API names (`CanonicalId`) derived from free-form text
//! - **Types**: field types and object-level enums understood by the renderer
//! - **Traits**: `Validatable`
//! - **Errors**: unified error handling with `ForgeError` and `ForgeResult`
//!

pub mod error;
pub mod naming;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{ForgeError, ForgeResult, ResultExt};
pub use naming::{CUSTOM_SUFFIX, CanonicalId, file_stem, is_safe_file_stem, normalize};
pub use traits::Validatable;
pub use types::{FieldType, SharingModel};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
