//! # Render Context
//!
//! The `RenderContext` wraps a [`FinalSchema`] together with the generator
//! configuration and owns the artifact path layout, so every renderer agrees
//! on where its file goes.

use metaforge_core::CanonicalId;
use metaforge_ir::{FinalSchema, ObjectSpec, ResolvedField};
use std::path::PathBuf;

use crate::{ArtifactKind, GeneratorConfig};

/// Context carrying everything the renderers need
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    schema: &'a FinalSchema,
    config: &'a GeneratorConfig,
}

impl<'a> RenderContext<'a> {
    pub fn new(schema: &'a FinalSchema, config: &'a GeneratorConfig) -> Self {
        Self { schema, config }
    }

    // ====================================================================
    // Accessors
    // ====================================================================

    pub fn schema(&self) -> &'a FinalSchema {
        self.schema
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    pub fn object(&self) -> &'a ObjectSpec {
        &self.schema.object
    }

    /// API name of the object
    pub fn object_id(&self) -> &'a CanonicalId {
        &self.schema.object.api_name
    }

    pub fn fields(&self) -> &'a [ResolvedField] {
        &self.schema.fields
    }

    pub fn api_version(&self) -> &'a str {
        &self.config.api_version
    }

    // ====================================================================
    // Paths (relative to the source directory)
    // ====================================================================

    /// `objects/<Obj>`
    pub fn object_dir(&self) -> PathBuf {
        PathBuf::from("objects").join(self.object_id().as_str())
    }

    /// `objects/<Obj>/<Obj>.object-meta.xml`
    pub fn object_path(&self) -> PathBuf {
        self.object_dir()
            .join(file_name(self.object_id().as_str(), ArtifactKind::Object))
    }

    /// `objects/<Obj>/fields/<Field>.field-meta.xml`
    pub fn field_path(&self, field: &CanonicalId) -> PathBuf {
        self.object_dir()
            .join("fields")
            .join(file_name(field.as_str(), ArtifactKind::Field))
    }

    /// `objects/<Obj>/validationRules/<Rule>.validationRule-meta.xml`
    pub fn validation_rule_path(&self, stem: &str) -> PathBuf {
        self.object_dir()
            .join("validationRules")
            .join(file_name(stem, ArtifactKind::ValidationRule))
    }

    /// `profiles/<Profile>.profile-meta.xml`
    pub fn profile_path(&self, stem: &str) -> PathBuf {
        PathBuf::from("profiles").join(file_name(stem, ArtifactKind::Profile))
    }

    /// `permissionsets/<Set>.permissionset-meta.xml`
    pub fn permission_set_path(&self, stem: &str) -> PathBuf {
        PathBuf::from("permissionsets").join(file_name(stem, ArtifactKind::PermissionSet))
    }

    /// `manifest/package.xml` (relative to the project root)
    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from("manifest").join("package.xml")
    }
}

fn file_name(stem: &str, kind: ArtifactKind) -> String {
    format!("{}{}", stem, kind.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_ir::{FieldSpec, FieldType, SchemaDraft};

    #[test]
    fn test_paths() {
        let draft = SchemaDraft::new("Sales Order").with_field(FieldSpec::new("Unit Price", FieldType::Currency));
        let schema = FinalSchema::from_draft(&draft).unwrap();
        let config = GeneratorConfig::default();
        let ctx = RenderContext::new(&schema, &config);

        assert_eq!(
            ctx.object_path(),
            PathBuf::from("objects/Sales_Order__c/Sales_Order__c.object-meta.xml")
        );
        assert_eq!(
            ctx.field_path(&schema.fields[0].api_name),
            PathBuf::from("objects/Sales_Order__c/fields/Unit_Price__c.field-meta.xml")
        );
        assert_eq!(
            ctx.validation_rule_path("Price_Positive"),
            PathBuf::from("objects/Sales_Order__c/validationRules/Price_Positive.validationRule-meta.xml")
        );
        assert_eq!(
            ctx.profile_path("Standard_User"),
            PathBuf::from("profiles/Standard_User.profile-meta.xml")
        );
        assert_eq!(
            ctx.permission_set_path("Order_Admins"),
            PathBuf::from("permissionsets/Order_Admins.permissionset-meta.xml")
        );
        assert_eq!(ctx.manifest_path(), PathBuf::from("manifest/package.xml"));
    }
}
