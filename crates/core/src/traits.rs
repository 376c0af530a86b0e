//! Core traits for Metaforge
//!
//! Behaviour shared by the draft model, the configuration and anything else
//! that has to be checked before the pipeline is allowed to touch the disk.

use crate::error::ForgeResult;

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// Types implementing this trait can check their internal consistency
/// and return validation errors if the state is invalid.
///
/// # Example
///
/// ```rust,ignore
/// use metaforge_core::{ForgeError, ForgeResult, Validatable};
///
/// struct Rule {
///     name: String,
///     formula: String,
/// }
///
/// impl Validatable for Rule {
///     fn validate(&self) -> ForgeResult<()> {
///         if self.formula.trim().is_empty() {
///             return Err(ForgeError::validation("Formula cannot be empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validate the current state of the object
    ///
    /// Returns `Ok(())` if valid, or a `ForgeError` describing the problem.
    fn validate(&self) -> ForgeResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Get all validation errors (for types that can have multiple errors)
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;

    struct TestValidatable {
        valid: bool,
    }

    impl Validatable for TestValidatable {
        fn validate(&self) -> ForgeResult<()> {
            if self.valid {
                Ok(())
            } else {
                Err(ForgeError::validation("Invalid state"))
            }
        }
    }

    #[test]
    fn test_validatable_trait() {
        let valid = TestValidatable { valid: true };
        assert!(valid.is_valid());
        assert!(valid.validation_errors().is_empty());

        let invalid = TestValidatable { valid: false };
        assert!(!invalid.is_valid());
        assert_eq!(
            invalid.validation_errors(),
            vec!["Validation error: Invalid state".to_string()]
        );
    }
}
