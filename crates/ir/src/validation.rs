//! Validation rules and utilities for schema drafts
//!
//! The draft comes from a language model and is checked here before anything
//! is rendered or written. Errors abort the request; warnings are logged and
//! carried along (unresolved references, missing labels, empty field lists).

use crate::SchemaDraft;
use crate::resolve::{MatchKind, resolve_with_kind};
use metaforge_core::{
    CUSTOM_SUFFIX, ForgeError, ForgeResult, Validatable, file_stem, is_safe_file_stem, normalize,
};
use std::collections::HashSet;

/// Longest base name (without suffix) the platform accepts
pub const MAX_API_NAME_LEN: usize = 40;

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a failed validation result with an error
    pub fn error(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to ForgeResult (fails if any errors)
    pub fn to_result(self) -> ForgeResult<()> {
        if self.valid {
            Ok(())
        } else {
            let msg = self
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(ForgeError::validation(msg))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Path to the problematic element (e.g., "fields[2]")
    pub path: Option<String>,

    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            suggestion: None,
        }
    }

    /// Add a path to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a suggestion to the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

// ============================================================================
// ValidationErrorCode
// ============================================================================

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    // Object errors
    MissingObject,
    InvalidObjectName,

    // Field errors
    MissingFields,
    EmptyFieldName,
    InvalidFieldName,
    DuplicateFieldName,
    InvalidFieldAttributes,

    // Access errors
    UnsafeFileName,
    EmptyProfileName,
    DuplicateProfile,
    EmptyPermissionSetName,
    DuplicatePermissionSet,

    // Validation rule errors
    EmptyRuleName,
    DuplicateRuleName,
    EmptyFormula,
    EmptyErrorMessage,
}

// ============================================================================
// ValidationWarning
// ============================================================================

/// A validation warning (non-fatal issue)
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Warning code
    pub code: ValidationWarningCode,

    /// Human-readable warning message
    pub message: String,

    /// Path to the element
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Create a new warning
    pub fn new(code: ValidationWarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Add a path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] Warning: {}", path, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

// ============================================================================
// ValidationWarningCode
// ============================================================================

/// Warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    NoFields,
    MissingLabel,
    NameFromLabel,
    UnresolvedReference,
    EmptyAccessEntry,
}

// ============================================================================
// DraftCheck Trait
// ============================================================================

/// A single check run against a draft
pub trait DraftCheck {
    /// Get the check name
    fn name(&self) -> &'static str;

    /// Validate a draft and return the result
    fn check(&self, draft: &SchemaDraft) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Draft validator that runs multiple checks
#[derive(Default)]
pub struct Validator {
    checks: Vec<Box<dyn DraftCheck>>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Create a validator with the default checks
    pub fn with_default_checks() -> Self {
        let mut validator = Self::new();
        validator.add_check(Box::new(ObjectCheck));
        validator.add_check(Box::new(FieldsCheck));
        validator.add_check(Box::new(ProfilesCheck));
        validator.add_check(Box::new(PermissionSetsCheck));
        validator.add_check(Box::new(ValidationRulesCheck));
        validator
    }

    /// Add a check
    pub fn add_check(&mut self, check: Box<dyn DraftCheck>) {
        self.checks.push(check);
    }

    /// Names of the registered checks, in run order
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Validate a draft with all checks
    pub fn validate(&self, draft: &SchemaDraft) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for check in &self.checks {
            let outcome = check.check(draft);
            tracing::debug!(
                check = check.name(),
                errors = outcome.errors.len(),
                warnings = outcome.warnings.len(),
                "draft check complete"
            );
            result.merge(outcome);
        }

        result
    }
}

/// Validate a draft with the default checks
pub fn validate_draft(draft: &SchemaDraft) -> ValidationResult {
    Validator::with_default_checks().validate(draft)
}

// ============================================================================
// Built-in Checks
// ============================================================================

/// The object name is present and yields a valid API name
pub struct ObjectCheck;

impl DraftCheck for ObjectCheck {
    fn name(&self) -> &'static str {
        "object"
    }

    fn check(&self, draft: &SchemaDraft) -> ValidationResult {
        let Some(object) = draft.object_name() else {
            return ValidationResult::error(
                ValidationError::new(
                    ValidationErrorCode::MissingObject,
                    "Invalid response format: missing object name",
                )
                .with_path("object"),
            );
        };

        let mut result = ValidationResult::ok();
        if !is_valid_api_name(normalize(object).as_str()) {
            result.add_error(
                ValidationError::new(
                    ValidationErrorCode::InvalidObjectName,
                    format!("Object name '{}' does not yield a valid API name", object),
                )
                .with_path("object")
                .with_suggestion("Use letters, digits and single spaces only"),
            );
        }
        result
    }
}

/// Fields are present, named, unique and internally consistent
pub struct FieldsCheck;

impl DraftCheck for FieldsCheck {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn check(&self, draft: &SchemaDraft) -> ValidationResult {
        let Some(fields) = &draft.fields else {
            return ValidationResult::error(
                ValidationError::new(
                    ValidationErrorCode::MissingFields,
                    "Invalid response format: missing fields array",
                )
                .with_path("fields"),
            );
        };

        let mut result = ValidationResult::ok();
        if fields.is_empty() {
            result.add_warning(
                ValidationWarning::new(
                    ValidationWarningCode::NoFields,
                    "Object has no custom fields",
                )
                .with_path("fields"),
            );
        }

        let mut seen = HashSet::new();
        for (i, field) in fields.iter().enumerate() {
            let path = format!("fields[{}]", i);

            if field.effective_name().trim().is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::EmptyFieldName,
                        "Field has neither a name nor a label",
                    )
                    .with_path(path),
                );
                continue;
            }

            if field.name.trim().is_empty() {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::NameFromLabel,
                        format!("Field has no name; using label '{}'", field.effective_name()),
                    )
                    .with_path(path.clone()),
                );
            } else if field.authored_label().is_none() {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::MissingLabel,
                        format!(
                            "Field '{}' has no label; using '{}'",
                            field.name,
                            field.display_label()
                        ),
                    )
                    .with_path(path.clone()),
                );
            }

            let api_name = field.api_name();
            if !is_valid_api_name(api_name.as_str()) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::InvalidFieldName,
                        format!(
                            "Field '{}' does not yield a valid API name ('{}')",
                            field.effective_name(),
                            api_name
                        ),
                    )
                    .with_path(path.clone())
                    .with_suggestion("Use letters, digits and single spaces only"),
                );
            }

            if !seen.insert(api_name.as_str().to_lowercase()) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::DuplicateFieldName,
                        format!("Duplicate field API name '{}'", api_name),
                    )
                    .with_path(path.clone()),
                );
            }

            if let Err(e) = field.validate() {
                result.add_error(
                    ValidationError::new(ValidationErrorCode::InvalidFieldAttributes, e.to_string())
                        .with_path(path),
                );
            }
        }

        result
    }
}

/// Profiles are named, unique, and reference known fields
pub struct ProfilesCheck;

impl DraftCheck for ProfilesCheck {
    fn name(&self) -> &'static str {
        "profiles"
    }

    fn check(&self, draft: &SchemaDraft) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let mut seen = HashSet::new();

        for (i, access) in draft.profile_access.iter().enumerate() {
            let path = format!("profileAccess[{}]", i);

            if access.profile.trim().is_empty() {
                result.add_error(
                    ValidationError::new(ValidationErrorCode::EmptyProfileName, "Profile name is empty")
                        .with_path(path),
                );
                continue;
            }

            if let Some(error) = unsafe_file_name("Profile", &access.profile, &path) {
                result.add_error(error);
                continue;
            }

            if !seen.insert(file_stem(&access.profile)) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::DuplicateProfile,
                        format!("Profile '{}' is configured more than once", access.profile),
                    )
                    .with_path(path.clone()),
                );
            }

            if access.fields.is_empty()
                && access.user_permissions.is_empty()
                && access.object_permissions.as_ref().is_none_or(|p| p.is_empty())
            {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::EmptyAccessEntry,
                        format!("Profile '{}' grants nothing", access.profile),
                    )
                    .with_path(path.clone()),
                );
            }

            for (j, fls) in access.fields.iter().enumerate() {
                warn_if_unresolved(
                    &mut result,
                    draft,
                    &fls.field,
                    format!("{}.fields[{}]", path, j),
                );
            }
        }

        result
    }
}

/// Permission sets are named, unique, and reference known fields
pub struct PermissionSetsCheck;

impl DraftCheck for PermissionSetsCheck {
    fn name(&self) -> &'static str {
        "permission_sets"
    }

    fn check(&self, draft: &SchemaDraft) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let mut seen = HashSet::new();

        for (i, set) in draft.permission_sets.iter().enumerate() {
            let path = format!("permissionSets[{}]", i);

            if set.name.trim().is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::EmptyPermissionSetName,
                        "Permission set name is empty",
                    )
                    .with_path(path),
                );
                continue;
            }

            if let Some(error) = unsafe_file_name("Permission set", &set.name, &path) {
                result.add_error(error);
                continue;
            }

            if !seen.insert(file_stem(&set.name)) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::DuplicatePermissionSet,
                        format!("Permission set '{}' is defined more than once", set.name),
                    )
                    .with_path(path.clone()),
                );
            }

            for (j, perm) in set.field_permissions.iter().enumerate() {
                let field = perm
                    .field
                    .split_once('.')
                    .map_or(perm.field.as_str(), |(_, f)| f);
                warn_if_unresolved(
                    &mut result,
                    draft,
                    field,
                    format!("{}.fieldPermissions[{}]", path, j),
                );
            }
        }

        result
    }
}

/// Validation rules are named, unique and complete
pub struct ValidationRulesCheck;

impl DraftCheck for ValidationRulesCheck {
    fn name(&self) -> &'static str {
        "validation_rules"
    }

    fn check(&self, draft: &SchemaDraft) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let mut seen = HashSet::new();

        for (i, rule) in draft.validation_rules.iter().enumerate() {
            let path = format!("validationRules[{}]", i);

            if rule.name.trim().is_empty() {
                result.add_error(
                    ValidationError::new(ValidationErrorCode::EmptyRuleName, "Validation rule name is empty")
                        .with_path(path),
                );
                continue;
            }

            if let Some(error) = unsafe_file_name("Validation rule", &rule.name, &path) {
                result.add_error(error);
                continue;
            }

            if !seen.insert(file_stem(&rule.name)) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::DuplicateRuleName,
                        format!("Validation rule '{}' is defined more than once", rule.name),
                    )
                    .with_path(path.clone()),
                );
            }

            if rule.error_condition_formula.trim().is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::EmptyFormula,
                        format!("Validation rule '{}' has no error condition formula", rule.name),
                    )
                    .with_path(path.clone()),
                );
            }

            if rule.error_message.trim().is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::EmptyErrorMessage,
                        format!("Validation rule '{}' has no error message", rule.name),
                    )
                    .with_path(path),
                );
            }
        }

        result
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Names that become file names must stay a single path component
fn unsafe_file_name(kind: &str, name: &str, path: &str) -> Option<ValidationError> {
    if is_safe_file_stem(&file_stem(name)) {
        return None;
    }
    Some(
        ValidationError::new(
            ValidationErrorCode::UnsafeFileName,
            format!("{} name '{}' cannot be used as a file name", kind, name),
        )
        .with_path(path)
        .with_suggestion("Use letters, digits, spaces, '_' and '-' only"),
    )
}

fn warn_if_unresolved(result: &mut ValidationResult, draft: &SchemaDraft, reference: &str, path: String) {
    let (id, kind) = resolve_with_kind(reference, draft.field_list());
    if kind == MatchKind::Fallback {
        result.add_warning(
            ValidationWarning::new(
                ValidationWarningCode::UnresolvedReference,
                format!("'{}' matches no field; using '{}'", reference, id),
            )
            .with_path(path),
        );
    }
}

/// Check a custom API name: an ASCII letter first, then letters, digits and
/// single underscores, no trailing underscore, the `__c` suffix, and a base
/// of at most [`MAX_API_NAME_LEN`] characters.
pub fn is_valid_api_name(api_name: &str) -> bool {
    let Some(base) = api_name.strip_suffix(CUSTOM_SUFFIX) else {
        return false;
    };

    let mut chars = base.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    first.is_ascii_alphabetic()
        && base.len() <= MAX_API_NAME_LEN
        && base.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !base.contains("__")
        && !base.ends_with('_')
}

// ============================================================================
// Tests
// ============================================================================
