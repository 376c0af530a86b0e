//! Saving and loading schema drafts
//!
//! A parsed draft can be written to disk, reviewed or edited by hand, and fed
//! back into rendering or deployment. Files are JSON, wrapped with a schema
//! version and the prompt that produced them. Bare drafts (the model's raw
//! JSON) load too.

use crate::{SCHEMA_VERSION, SchemaDraft};
use metaforge_core::{ForgeError, ForgeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extension for saved drafts
pub const DRAFT_EXTENSION: &str = "json";

// ============================================================================
// Draft File Wrapper
// ============================================================================

/// Wrapper for draft files that includes version information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    /// Schema version for migration purposes
    pub schema_version: u32,

    /// Prompt the draft was parsed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// The draft itself
    pub draft: SchemaDraft,
}

impl DraftFile {
    pub fn new(draft: SchemaDraft) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            prompt: None,
            draft,
        }
    }

    /// Record the originating prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

// ============================================================================
// Save Functions
// ============================================================================

/// Save a draft file, creating parent directories as needed
pub fn save_draft(file: &DraftFile, path: impl AsRef<Path>) -> ForgeResult<()> {
    let path = path.as_ref();

    let json = serde_json::to_string_pretty(file).map_err(|e| ForgeError::FileWrite {
        path: path.to_path_buf(),
        message: format!("Failed to serialize draft: {}", e),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ForgeError::DirectoryCreate {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }

    std::fs::write(path, json).map_err(|e| ForgeError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::debug!(path = %path.display(), "saved draft");
    Ok(())
}

// ============================================================================
// Load Functions
// ============================================================================

/// Load a draft from a file
pub fn load_draft(path: impl AsRef<Path>) -> ForgeResult<DraftFile> {
    let path = path.as_ref();

    let json = std::fs::read_to_string(path).map_err(|e| ForgeError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    load_draft_from_string(&json).map_err(|e| match e {
        ForgeError::Json(je) => ForgeError::FileRead {
            path: path.to_path_buf(),
            message: format!("Invalid draft file format: {}", je),
        },
        other => other,
    })
}

/// Load a draft from a JSON string, wrapped or bare
pub fn load_draft_from_string(json: &str) -> ForgeResult<DraftFile> {
    if let Ok(file) = serde_json::from_str::<DraftFile>(json) {
        if file.schema_version > SCHEMA_VERSION {
            return Err(ForgeError::parse(format!(
                "Draft schema version {} is newer than supported version {}",
                file.schema_version, SCHEMA_VERSION
            )));
        }
        return Ok(file);
    }

    let draft = SchemaDraft::from_json(json)?;
    Ok(DraftFile::new(draft))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldSpec;
    use metaforge_core::FieldType;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_draft() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drafts").join("car.json");

        let draft = SchemaDraft::new("Car").with_field(FieldSpec::new("Price", FieldType::Currency));
        save_draft(&DraftFile::new(draft.clone()).with_prompt("Create a car"), &path).unwrap();

        let loaded = load_draft(&path).unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.prompt.as_deref(), Some("Create a car"));
        assert_eq!(loaded.draft, draft);
    }

    #[test]
    fn test_load_bare_draft() {
        let file = load_draft_from_string(r#"{"object": "Car", "fields": []}"#).unwrap();
        assert_eq!(file.draft.object_name(), Some("Car"));
        assert!(file.prompt.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_draft(temp_dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ForgeError::FileRead { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_draft(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid draft file format"));
    }

    #[test]
    fn test_newer_schema_version_is_rejected() {
        let json = format!(
            r#"{{"schemaVersion": {}, "draft": {{"object": "Car", "fields": []}}}}"#,
            SCHEMA_VERSION + 1
        );
        assert!(load_draft_from_string(&json).unwrap_err().is_parse());
    }
}
