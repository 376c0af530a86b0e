//! Custom object definition (`<CustomObject>`)

use crate::context::RenderContext;
use crate::xml::XmlWriter;
use crate::{ArtifactKind, GeneratedFile};

/// Render `objects/<Obj>/<Obj>.object-meta.xml`
pub fn render_object(ctx: &RenderContext<'_>) -> GeneratedFile {
    let object = ctx.object();
    let mut xml = XmlWriter::new("CustomObject");

    xml.element("fullName", &object.api_name)
        .element("deploymentStatus", "Deployed")
        .optional("description", object.description.as_deref())
        .element("label", &object.label)
        .open("nameField")
        .element("label", &object.name_field_label)
        .element("type", "Text")
        .close()
        .element("pluralLabel", &object.plural_label)
        .element("sharingModel", object.sharing_model.metadata_name());

    GeneratedFile::new(ctx.object_path(), xml.finish(), ArtifactKind::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorConfig;
    use metaforge_ir::{FinalSchema, SchemaDraft};

    #[test]
    fn test_render_object() {
        let schema = FinalSchema::from_draft(&SchemaDraft::new("Car")).unwrap();
        let config = GeneratorConfig::default();
        let file = render_object(&RenderContext::new(&schema, &config));

        assert_eq!(file.kind, ArtifactKind::Object);
        assert!(file.content.contains("<fullName>Car__c</fullName>"));
        assert!(file.content.contains("<label>Car</label>"));
        assert!(file.content.contains("<pluralLabel>Cars</pluralLabel>"));
        assert!(file.content.contains("<label>Car Name</label>"));
        assert!(file.content.contains("<sharingModel>ReadWrite</sharingModel>"));
        assert!(!file.content.contains("<description>"));
    }

    #[test]
    fn test_object_label_is_escaped() {
        let mut draft = SchemaDraft::new("Parts");
        draft.plural_label = Some("Parts & Tools".to_string());
        let schema = FinalSchema::from_draft(&draft).unwrap();
        let config = GeneratorConfig::default();
        let file = render_object(&RenderContext::new(&schema, &config));

        assert!(file.content.contains("<pluralLabel>Parts &amp; Tools</pluralLabel>"));
    }
}
