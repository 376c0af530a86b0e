//! Custom field definitions (`<CustomField>`)
//!
//! Type-specific attributes and their defaults:
//!
//! | Type          | Attributes                                  |
//! |---------------|---------------------------------------------|
//! | Text          | length (100)                                |
//! | LongTextArea  | length (32768), visibleLines (3)            |
//! | Number        | precision (18), scale (0)                   |
//! | Currency      | precision (18), scale (2)                   |
//! | Percent       | precision (5), scale (2)                    |
//! | Checkbox      | defaultValue (false)                        |
//! | Picklist      | restricted valueSet (values required)       |
//! | others        | none                                        |

use metaforge_core::{FieldType, ForgeError, ForgeResult};
use metaforge_ir::ResolvedField;

use crate::context::RenderContext;
use crate::xml::XmlWriter;
use crate::{ArtifactKind, GeneratedFile};

/// Default visible lines of a long text area
pub const DEFAULT_VISIBLE_LINES: u32 = 3;

/// Render one file per field, in field order
pub fn render_fields(ctx: &RenderContext<'_>) -> ForgeResult<Vec<GeneratedFile>> {
    ctx.fields()
        .iter()
        .map(|field| {
            let content = render_field(field)?;
            Ok(GeneratedFile::new(
                ctx.field_path(&field.api_name),
                content,
                ArtifactKind::Field,
            ))
        })
        .collect()
}

/// Render the XML of a single field
pub fn render_field(field: &ResolvedField) -> ForgeResult<String> {
    let spec = &field.spec;
    let field_type = &spec.field_type;

    if !field_type.is_known() {
        return Err(ForgeError::UnsupportedFieldType {
            field: field.api_name.to_string(),
            field_type: field_type.to_string(),
        });
    }

    if *field_type == FieldType::Picklist && spec.picklist_values.is_empty() {
        return Err(ForgeError::MissingFieldAttribute {
            field: field.api_name.to_string(),
            field_type: field_type.to_string(),
            attribute: "picklistValues".to_string(),
        });
    }

    let mut xml = XmlWriter::new("CustomField");
    xml.element("fullName", &field.api_name);

    if *field_type == FieldType::Checkbox {
        let default = spec.default_value.as_ref().is_some_and(|v| v.as_bool());
        xml.element("defaultValue", default);
    }

    xml.optional("description", spec.description.as_deref())
        .element("externalId", false)
        .optional("inlineHelpText", spec.help_text.as_deref())
        .element("label", &field.label);

    if let Some(default_length) = field_type.default_length() {
        xml.element("length", spec.length.unwrap_or(default_length));
    }

    let precision_scale = field_type
        .default_precision_scale()
        .map(|(p, s)| (spec.precision.unwrap_or(p), spec.scale.unwrap_or(s)));

    if let Some((precision, _)) = precision_scale {
        xml.element("precision", precision);
    }

    // Checkbox fields reject <required>
    if *field_type != FieldType::Checkbox {
        xml.element("required", spec.required);
    }

    if let Some((_, scale)) = precision_scale {
        xml.element("scale", scale);
    }

    xml.element("trackFeedHistory", false)
        .element("trackHistory", false)
        .element("trackTrending", false)
        .element("type", field_type.metadata_name());

    if *field_type == FieldType::Picklist {
        write_value_set(&mut xml, &spec.picklist_values);
    }

    if *field_type == FieldType::LongTextArea {
        xml.element(
            "visibleLines",
            spec.visible_lines.unwrap_or(DEFAULT_VISIBLE_LINES),
        );
    }

    Ok(xml.finish())
}

fn write_value_set(xml: &mut XmlWriter, values: &[String]) {
    xml.open("valueSet")
        .element("restricted", true)
        .open("valueSetDefinition")
        .element("sorted", false);

    for value in values {
        xml.open("value")
            .element("fullName", value)
            .element("default", false)
            .element("label", value)
            .close();
    }

    xml.close().close();
}
