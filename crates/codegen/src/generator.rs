//! # Render Orchestrator
//!
//! The `Generator` is the top-level entry point for rendering. It takes a
//! [`FinalSchema`] and a [`GeneratorConfig`], builds a [`RenderContext`], and
//! delegates to the metadata renderers to produce an [`ArtifactSet`].
//!
//! ## Pipeline
//!
//! ```text
//! FinalSchema + GeneratorConfig
//!         │
//!         ▼
//!   RenderContext::new()
//!         │
//!         ├──► metadata::render_object()            → object
//!         ├──► metadata::render_fields()            → fields
//!         ├──► metadata::render_validation_rules()  → validation rules
//!         ├──► metadata::render_profiles()          → profiles
//!         ├──► metadata::render_permission_sets()   → permission sets
//!         ├──► metadata::render_manifest()          → manifest
//!         │
//!         ▼
//!   ArtifactSet { files }
//! ```
//!
//! Rendering is all-or-nothing: any error (unknown field type, picklist
//! without values) is returned before anything is written.

use chrono::{DateTime, Utc};
use metaforge_core::ForgeResult;
use metaforge_ir::FinalSchema;

use crate::context::RenderContext;
use crate::metadata;
use crate::{ArtifactKind, ArtifactSet, GeneratorConfig};

// ============================================================================
// Generator
// ============================================================================

/// Top-level renderer.
///
/// Stateless aside from its configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    // ====================================================================
    // Construction
    // ====================================================================

    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    // ====================================================================
    // Rendering
    // ====================================================================

    /// Render every artifact of a schema, in deployment order.
    ///
    /// # Errors
    ///
    /// Returns a render error if any field cannot be rendered.
    pub fn render(&self, schema: &FinalSchema) -> ForgeResult<ArtifactSet> {
        let ctx = RenderContext::new(schema, &self.config);
        let mut output = ArtifactSet::new(ctx.object_id().as_str());

        output.add_file(metadata::render_object(&ctx));
        output.extend(metadata::render_fields(&ctx)?);
        output.extend(metadata::render_validation_rules(&ctx));
        output.extend(metadata::render_profiles(&ctx));
        output.extend(metadata::render_permission_sets(&ctx));

        if self.config.include_manifest {
            output.add_file(metadata::render_manifest(&ctx));
        }

        tracing::info!(
            object = %output.object,
            files = output.file_count(),
            "rendering complete",
        );

        Ok(output)
    }

    /// Render and write all files under the configured output directory
    pub fn render_and_write(&self, schema: &FinalSchema) -> ForgeResult<ArtifactSet> {
        let output = self.render(schema)?;
        output.write_to_disk(&self.config.output_dir)?;
        tracing::info!(
            output_dir = %self.config.output_dir.display(),
            files = output.file_count(),
            "files written to disk",
        );
        Ok(output)
    }
}

// ============================================================================
// Standalone convenience functions
// ============================================================================

/// Render a schema with the default configuration
pub fn render(schema: &FinalSchema) -> ForgeResult<ArtifactSet> {
    Generator::with_defaults().render(schema)
}

/// Render a schema and write it under `output_dir`
pub fn render_to_dir(
    schema: &FinalSchema,
    output_dir: impl Into<std::path::PathBuf>,
) -> ForgeResult<ArtifactSet> {
    let config = GeneratorConfig::new().with_output_dir(output_dir);
    Generator::new(config).render_and_write(schema)
}

// ============================================================================
// GenerationSummary
// ============================================================================

/// A human-readable summary of a rendering run
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub object: String,
    pub total_files: usize,
    pub fields: usize,
    pub validation_rules: usize,
    pub profiles: usize,
    pub permission_sets: usize,
    pub total_bytes: usize,
    pub generated_at: DateTime<Utc>,
}

impl GenerationSummary {
    pub fn from_artifacts(artifacts: &ArtifactSet) -> Self {
        Self {
            object: artifacts.object.clone(),
            total_files: artifacts.file_count(),
            fields: artifacts.count(ArtifactKind::Field),
            validation_rules: artifacts.count(ArtifactKind::ValidationRule),
            profiles: artifacts.count(ArtifactKind::Profile),
            permission_sets: artifacts.count(ArtifactKind::PermissionSet),
            total_bytes: artifacts.total_bytes(),
            generated_at: Utc::now(),
        }
    }

    /// Format the summary as a boxed report
    pub fn display(&self) -> String {
        let mut out = String::with_capacity(512);

        out.push_str("╔══════════════════════════════════════════════════╗\n");
        out.push_str("║         Metadata Rendering Complete              ║\n");
        out.push_str("╠══════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Object:          {:<31}║\n", self.object));
        out.push_str(&format!("║  Total Files:     {:<31}║\n", self.total_files));
        out.push_str(&format!("║    Fields:        {:<31}║\n", self.fields));
        out.push_str(&format!("║    Rules:         {:<31}║\n", self.validation_rules));
        out.push_str(&format!("║    Profiles:      {:<31}║\n", self.profiles));
        out.push_str(&format!("║    Perm Sets:     {:<31}║\n", self.permission_sets));

        let size_str = if self.total_bytes < 1024 {
            format!("{} B", self.total_bytes)
        } else {
            format!("{:.1} KB", self.total_bytes as f64 / 1024.0)
        };
        out.push_str(&format!("║  Total Size:      {:<31}║\n", size_str));
        out.push_str(&format!(
            "║  Generated:       {:<31}║\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str("╚══════════════════════════════════════════════════╝\n");

        out
    }
}

impl std::fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Produce a [`GenerationSummary`] from an [`ArtifactSet`]
pub fn summarize(artifacts: &ArtifactSet) -> GenerationSummary {
    GenerationSummary::from_artifacts(artifacts)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_ir::{
        FieldSpec, FieldType, PermissionSetSpec, ProfileAccess, SchemaDraft, ValidationRuleSpec,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn car_draft() -> SchemaDraft {
        SchemaDraft::from_json(
            r#"{"object": "Car", "fields": [
                {"name": "Name", "type": "Text"},
                {"name": "Price", "type": "Currency"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_car_renders_one_object_and_two_fields() {
        let schema = FinalSchema::from_draft(&car_draft()).unwrap();
        let output = render(&schema).unwrap();

        assert_eq!(output.object, "Car__c");
        assert_eq!(output.count(ArtifactKind::Object), 1);
        assert_eq!(output.count(ArtifactKind::Field), 2);
        assert_eq!(output.count(ArtifactKind::Manifest), 1);
        assert_eq!(output.file_count(), 4);

        let paths: Vec<PathBuf> = output
            .files_by_kind(ArtifactKind::Field)
            .iter()
            .map(|f| f.path.clone())
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("objects/Car__c/fields/Name__c.field-meta.xml"),
                PathBuf::from("objects/Car__c/fields/Price__c.field-meta.xml"),
            ]
        );
        assert!(
            output.files[0]
                .content
                .contains("<fullName>Car__c</fullName>")
        );
    }

    #[test]
    fn test_render_order() {
        let draft = car_draft()
            .with_validation_rule(ValidationRuleSpec::new("Price Positive", "Price < 0", "No"))
            .with_profile(ProfileAccess::new("Standard User").with_field("Price", true, false))
            .with_permission_set(PermissionSetSpec::new("Car Editors").with_field("Car.Price", true, true));
        let schema = FinalSchema::from_draft(&draft).unwrap();
        let output = render(&schema).unwrap();

        let kinds: Vec<ArtifactKind> = output.files.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArtifactKind::Object,
                ArtifactKind::Field,
                ArtifactKind::Field,
                ArtifactKind::ValidationRule,
                ArtifactKind::Profile,
                ArtifactKind::PermissionSet,
                ArtifactKind::Manifest,
            ]
        );
    }

    #[test]
    fn test_without_manifest() {
        let schema = FinalSchema::from_draft(&car_draft()).unwrap();
        let output = Generator::new(GeneratorConfig::new().without_manifest())
            .render(&schema)
            .unwrap();
        assert!(!output.has(ArtifactKind::Manifest));
    }

    #[test]
    fn test_render_error_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let draft = car_draft().with_field(FieldSpec::new("Color", FieldType::Picklist));
        let schema = FinalSchema::from_draft(&draft).unwrap();

        let err = render_to_dir(&schema, temp_dir.path()).unwrap_err();
        assert!(err.is_render());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_render_to_dir() {
        let temp_dir = TempDir::new().unwrap();
        let schema = FinalSchema::from_draft(&car_draft()).unwrap();
        render_to_dir(&schema, temp_dir.path()).unwrap();

        assert!(
            temp_dir
                .path()
                .join("force-app/main/default/objects/Car__c/Car__c.object-meta.xml")
                .exists()
        );
        assert!(temp_dir.path().join("manifest/package.xml").exists());
    }

    #[test]
    fn test_generation_summary() {
        let schema = FinalSchema::from_draft(&car_draft()).unwrap();
        let summary = summarize(&render(&schema).unwrap());

        assert_eq!(summary.object, "Car__c");
        assert_eq!(summary.fields, 2);
        assert_eq!(summary.total_files, 4);
        assert!(summary.to_string().contains("Metadata Rendering Complete"));
    }
}
