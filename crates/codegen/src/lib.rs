//! # Metaforge Codegen
//!
//! Renders a [`FinalSchema`](metaforge_ir::FinalSchema) into Salesforce
//! source-format metadata.
//!
//! ## Artifacts
//!
//! - **Object**: `objects/<Obj>/<Obj>.object-meta.xml`
//! - **Fields**: `objects/<Obj>/fields/<Field>.field-meta.xml`
//! - **Validation rules**: `objects/<Obj>/validationRules/<Rule>.validationRule-meta.xml`
//! - **Profiles**: `profiles/<Profile>.profile-meta.xml`
//! - **Permission sets**: `permissionsets/<Set>.permissionset-meta.xml`
//! - **Manifest**: `manifest/package.xml`
//!
//! Metadata paths are relative to the source directory
//! (`force-app/main/default`); the manifest is relative to the project root.
//!

// ============================================================================
// Modules
// ============================================================================

pub mod context;
pub mod generator;
pub mod metadata;
pub mod xml;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::RenderContext;
pub use generator::{GenerationSummary, Generator, render, render_to_dir, summarize};

use metaforge_core::{ForgeError, ForgeResult};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Source directory of an SFDX project, relative to the project root
pub const SOURCE_DIR: &str = "force-app/main/default";

/// Metadata API version written to the manifest
pub const DEFAULT_API_VERSION: &str = "64.0";

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Configuration for the metadata renderer
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Project root the artifacts are written under
    pub output_dir: PathBuf,

    /// Metadata API version for the manifest
    pub api_version: String,

    /// Whether to emit `manifest/package.xml`
    pub include_manifest: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            api_version: DEFAULT_API_VERSION.to_string(),
            include_manifest: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the metadata API version
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Skip the deployment manifest
    pub fn without_manifest(mut self) -> Self {
        self.include_manifest = false;
        self
    }
}

// ============================================================================
// ArtifactKind
// ============================================================================

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Object,
    Field,
    ValidationRule,
    Profile,
    PermissionSet,
    Manifest,
}

impl ArtifactKind {
    /// Whether the artifact lives under the source directory
    pub fn is_source(&self) -> bool {
        !matches!(self, ArtifactKind::Manifest)
    }

    /// Metadata file suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Object => ".object-meta.xml",
            ArtifactKind::Field => ".field-meta.xml",
            ArtifactKind::ValidationRule => ".validationRule-meta.xml",
            ArtifactKind::Profile => ".profile-meta.xml",
            ArtifactKind::PermissionSet => ".permissionset-meta.xml",
            ArtifactKind::Manifest => ".xml",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArtifactKind::Object => "object",
            ArtifactKind::Field => "field",
            ArtifactKind::ValidationRule => "validation rule",
            ArtifactKind::Profile => "profile",
            ArtifactKind::PermissionSet => "permission set",
            ArtifactKind::Manifest => "manifest",
        };
        f.write_str(s)
    }
}

// ============================================================================
// GeneratedFile
// ============================================================================

/// A single rendered artifact
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    /// Path relative to the source directory (or the project root for the
    /// manifest)
    pub path: PathBuf,

    /// File content
    pub content: String,

    pub kind: ArtifactKind,
}

impl GeneratedFile {
    /// Create a new generated file
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind,
        }
    }

    /// Path relative to the project root
    pub fn project_path(&self) -> PathBuf {
        if self.kind.is_source() {
            Path::new(SOURCE_DIR).join(&self.path)
        } else {
            self.path.clone()
        }
    }
}

// ============================================================================
// ArtifactSet
// ============================================================================

/// All artifacts rendered for one schema, in render order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactSet {
    /// API name of the rendered object
    pub object: String,

    pub files: Vec<GeneratedFile>,
}

impl ArtifactSet {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            files: Vec::new(),
        }
    }

    /// Add a file
    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    /// Add several files
    pub fn extend(&mut self, files: impl IntoIterator<Item = GeneratedFile>) {
        self.files.extend(files);
    }

    /// Get the number of files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Get files by kind
    pub fn files_by_kind(&self, kind: ArtifactKind) -> Vec<&GeneratedFile> {
        self.files.iter().filter(|f| f.kind == kind).collect()
    }

    /// Number of files of a kind
    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.files.iter().filter(|f| f.kind == kind).count()
    }

    /// Whether any file of the kind was rendered
    pub fn has(&self, kind: ArtifactKind) -> bool {
        self.files.iter().any(|f| f.kind == kind)
    }

    /// Find a file by its path relative to the project root
    pub fn find(&self, project_path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        let wanted = project_path.as_ref();
        self.files.iter().find(|f| f.project_path() == wanted)
    }

    /// Total bytes of rendered content
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }

    /// Write all files under a project root.
    ///
    /// Returns the written paths, in render order. Nothing is written if any
    /// path would land outside `base_dir`.
    pub fn write_to_disk(&self, base_dir: impl AsRef<Path>) -> ForgeResult<Vec<PathBuf>> {
        let base_dir = base_dir.as_ref();

        if let Some(file) = self.files.iter().find(|f| !is_contained(&f.project_path())) {
            return Err(ForgeError::FileWrite {
                path: base_dir.join(file.project_path()),
                message: "path escapes the output directory".to_string(),
            });
        }

        let mut written = Vec::with_capacity(self.files.len());

        for file in &self.files {
            let full_path = base_dir.join(file.project_path());

            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ForgeError::DirectoryCreate {
                    path: parent.to_path_buf(),
                    message: e.to_string(),
                })?;
            }

            std::fs::write(&full_path, &file.content).map_err(|e| ForgeError::FileWrite {
                path: full_path.clone(),
                message: e.to_string(),
            })?;

            tracing::debug!(path = %full_path.display(), kind = %file.kind, "wrote artifact");
            written.push(full_path);
        }

        Ok(written)
    }
}

/// Relative path made of plain components only (no `..`, root or prefix)
fn is_contained(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.api_version, "64.0");
        assert!(config.include_manifest);
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new()
            .with_output_dir("/tmp/output")
            .with_api_version("62.0")
            .without_manifest();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/output"));
        assert_eq!(config.api_version, "62.0");
        assert!(!config.include_manifest);
    }

    #[test]
    fn test_project_path() {
        let field = GeneratedFile::new(
            "objects/Car__c/fields/Price__c.field-meta.xml",
            "",
            ArtifactKind::Field,
        );
        assert_eq!(
            field.project_path(),
            PathBuf::from("force-app/main/default/objects/Car__c/fields/Price__c.field-meta.xml")
        );

        let manifest = GeneratedFile::new("manifest/package.xml", "", ArtifactKind::Manifest);
        assert_eq!(manifest.project_path(), PathBuf::from("manifest/package.xml"));
    }

    #[test]
    fn test_artifact_set_counts() {
        let mut set = ArtifactSet::new("Car__c");
        set.add_file(GeneratedFile::new("a", "x", ArtifactKind::Object));
        set.add_file(GeneratedFile::new("b", "yy", ArtifactKind::Field));
        set.add_file(GeneratedFile::new("c", "zzz", ArtifactKind::Field));

        assert_eq!(set.file_count(), 3);
        assert_eq!(set.count(ArtifactKind::Field), 2);
        assert!(!set.has(ArtifactKind::Profile));
        assert_eq!(set.total_bytes(), 6);
    }

    #[test]
    fn test_write_to_disk() {
        let temp_dir = TempDir::new().unwrap();
        let mut set = ArtifactSet::new("Car__c");
        set.add_file(GeneratedFile::new(
            "profiles/Admin.profile-meta.xml",
            "<Profile/>",
            ArtifactKind::Profile,
        ));

        let written = set.write_to_disk(temp_dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        let content = std::fs::read_to_string(
            temp_dir
                .path()
                .join("force-app/main/default/profiles/Admin.profile-meta.xml"),
        )
        .unwrap();
        assert_eq!(content, "<Profile/>");
    }

    #[test]
    fn test_write_to_disk_rejects_escaping_paths() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("a/b");
        let mut set = ArtifactSet::new("Car__c");
        set.add_file(GeneratedFile::new("objects/Car__c/Car__c.object-meta.xml", "<CustomObject/>", ArtifactKind::Object));
        set.add_file(GeneratedFile::new(
            "profiles/../../../../../escaped.profile-meta.xml",
            "<Profile/>",
            ArtifactKind::Profile,
        ));

        let err = set.write_to_disk(&out).unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("escapes the output directory"));
        assert!(!out.exists());
        assert!(!temp_dir.path().join("escaped.profile-meta.xml").exists());
    }
}
