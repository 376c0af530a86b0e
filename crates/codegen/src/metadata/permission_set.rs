//! Permission sets (`<PermissionSet>`)

use metaforge_ir::ResolvedPermissionSet;

use crate::context::RenderContext;
use crate::metadata::{write_field_permission, write_object_permissions};
use crate::xml::XmlWriter;
use crate::{ArtifactKind, GeneratedFile};

/// Render one file per permission set
pub fn render_permission_sets(ctx: &RenderContext<'_>) -> Vec<GeneratedFile> {
    ctx.schema()
        .permission_sets
        .iter()
        .map(|set| {
            GeneratedFile::new(
                ctx.permission_set_path(&set.file_stem),
                render_permission_set(set),
                ArtifactKind::PermissionSet,
            )
        })
        .collect()
}

pub fn render_permission_set(set: &ResolvedPermissionSet) -> String {
    let mut xml = XmlWriter::new("PermissionSet");
    xml.optional("description", set.description.as_deref());

    for perm in &set.field_permissions {
        write_field_permission(&mut xml, perm);
    }

    xml.element("label", &set.label);

    if let Some(perms) = &set.object_permissions {
        write_object_permissions(&mut xml, perms);
    }

    xml.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorConfig;
    use metaforge_ir::{
        FieldSpec, FieldType, FinalSchema, ObjectPermissions, PermissionSetSpec, SchemaDraft,
    };

    fn schema_with(set: PermissionSetSpec) -> FinalSchema {
        let draft = SchemaDraft::new("Car")
            .with_field(FieldSpec::new("Price", FieldType::Currency))
            .with_permission_set(set);
        FinalSchema::from_draft(&draft).unwrap()
    }

    #[test]
    fn test_render_permission_set() {
        let mut set = PermissionSetSpec::new("Car Managers").with_field("Car.Price", true, true);
        set.label = Some("Car Managers".into());
        set.object_permissions = Some(ObjectPermissions::read_write().for_object("Car"));

        let schema = schema_with(set);
        let config = GeneratorConfig::default();
        let files = render_permission_sets(&RenderContext::new(&schema, &config));

        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].path,
            std::path::PathBuf::from("permissionsets/Car_Managers.permissionset-meta.xml")
        );

        let xml = &files[0].content;
        assert!(xml.contains("<label>Car Managers</label>"));
        assert!(xml.contains("<field>Car__c.Price__c</field>"));
        assert!(xml.contains("<object>Car__c</object>"));
        assert!(xml.find("<fieldPermissions>") < xml.find("<label>"));
        assert!(xml.find("<label>") < xml.find("<objectPermissions>"));
    }

    #[test]
    fn test_label_defaults_to_name() {
        let schema = schema_with(PermissionSetSpec::new("Readers").with_field("Price", true, false));
        let xml = render_permission_set(&schema.permission_sets[0]);

        assert!(xml.contains("<label>Readers</label>"));
        assert!(xml.contains("<field>Car__c.Price__c</field>"));
        assert!(!xml.contains("<objectPermissions>"));
    }
}
