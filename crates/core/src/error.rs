//! Error types for Metaforge
//!
//! Every stage of a request (prompt parsing, draft validation, artifact
//! rendering, deployment) reports failures through [`ForgeError`]. Any error
//! aborts the request and is surfaced to the caller verbatim.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for Metaforge
#[derive(Debug, Error)]
pub enum ForgeError {
    // ========================================================================
    // Prompt Parsing Errors
    // ========================================================================
    /// The model call failed or returned content that could not be parsed
    #[error("Failed to parse prompt: {0}")]
    Parse(String),

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// The schema draft is missing required attributes or is inconsistent
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single field of the draft failed validation
    #[error("Field validation failed for '{object}.{field}': {message}")]
    FieldValidation {
        object: String,
        field: String,
        message: String,
    },

    // ========================================================================
    // Rendering Errors
    // ========================================================================
    /// Artifact rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// A field type is not one the renderer knows how to emit
    #[error("Unsupported field type '{field_type}' on field '{field}'")]
    UnsupportedFieldType { field: String, field_type: String },

    /// A field type requires an attribute the draft did not provide
    #[error("Field '{field}' of type {field_type} requires '{attribute}'")]
    MissingFieldAttribute {
        field: String,
        field_type: String,
        attribute: String,
    },

    // ========================================================================
    // Deployment Errors
    // ========================================================================
    /// An external deployment step exited unsuccessfully
    #[error("{step} deployment failed (exit code {}): {message}", exit_code_label(.exit_code))]
    Deploy {
        step: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// The project directory is not a deployable project
    #[error("Not a deployable project: {0}")]
    ProjectLayout(String),

    /// An external operation exceeded its time budget
    #[error("{operation} timed out after {}s", whole_secs(.after))]
    Timeout { operation: String, after: Duration },

    /// The shared output location could not be locked
    #[error("Failed to lock '{path}': {message}")]
    Lock { path: PathBuf, message: String },

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// Directory creation failed
    #[error("Failed to create directory '{path}': {message}")]
    DirectoryCreate { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl ForgeError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        ForgeError::Parse(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        ForgeError::Validation(msg.into())
    }

    /// Create a field validation error
    pub fn field_validation(
        object: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        ForgeError::FieldValidation {
            object: object.into(),
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        ForgeError::Render(msg.into())
    }

    /// Create a deploy error for a named step
    pub fn deploy(step: impl Into<String>, exit_code: Option<i32>, msg: impl Into<String>) -> Self {
        ForgeError::Deploy {
            step: step.into(),
            exit_code,
            message: msg.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        ForgeError::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        ForgeError::Internal(msg.into())
    }

    /// Create an error with context
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        ForgeError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Check if this error came from prompt parsing
    pub fn is_parse(&self) -> bool {
        matches!(self, ForgeError::Parse(_) | ForgeError::Json(_))
    }

    /// Check if this error is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ForgeError::Validation(_) | ForgeError::FieldValidation { .. }
        )
    }

    /// Check if this error is a rendering error
    pub fn is_render(&self) -> bool {
        matches!(
            self,
            ForgeError::Render(_)
                | ForgeError::UnsupportedFieldType { .. }
                | ForgeError::MissingFieldAttribute { .. }
        )
    }

    /// Check if this error came from the deployment stage
    pub fn is_deploy(&self) -> bool {
        matches!(
            self,
            ForgeError::Deploy { .. } | ForgeError::ProjectLayout(_)
        )
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ForgeError::Io(_)
                | ForgeError::FileRead { .. }
                | ForgeError::FileWrite { .. }
                | ForgeError::DirectoryCreate { .. }
        )
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn whole_secs(after: &Duration) -> u64 {
    after.as_secs()
}

/// Result type alias using ForgeError
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> ForgeResult<T>;
}

impl<T, E: Into<ForgeError>> ResultExt<T> for Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> ForgeResult<T> {
        self.map_err(|e| {
            let err: ForgeError = e.into();
            ForgeError::WithContext {
                context: context.into(),
                message: err.to_string(),
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
