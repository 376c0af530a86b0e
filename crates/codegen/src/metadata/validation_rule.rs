//! Validation rules (`<ValidationRule>`)

use metaforge_ir::ResolvedValidationRule;

use crate::context::RenderContext;
use crate::xml::XmlWriter;
use crate::{ArtifactKind, GeneratedFile};

/// Render one file per validation rule
pub fn render_validation_rules(ctx: &RenderContext<'_>) -> Vec<GeneratedFile> {
    ctx.schema()
        .validation_rules
        .iter()
        .map(|rule| {
            GeneratedFile::new(
                ctx.validation_rule_path(&rule.file_stem),
                render_validation_rule(rule),
                ArtifactKind::ValidationRule,
            )
        })
        .collect()
}

/// Render the XML of one rule. The description defaults to the rule name.
pub fn render_validation_rule(rule: &ResolvedValidationRule) -> String {
    let description = rule
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(&rule.name);

    let mut xml = XmlWriter::new("ValidationRule");
    xml.element("fullName", &rule.file_stem)
        .element("active", rule.active)
        .element("description", description)
        .element("errorConditionFormula", &rule.formula)
        .element("errorMessage", &rule.error_message);
    xml.finish()
}
