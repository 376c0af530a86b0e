//! # Metadata Renderers
//!
//! One module per artifact kind. Each renderer takes the
//! [`RenderContext`](crate::RenderContext)
//! and returns the files for its kind in schema order.

pub mod field;
pub mod manifest;
pub mod object;
pub mod permission_set;
pub mod profile;
pub mod validation_rule;

pub use field::render_fields;
pub use manifest::render_manifest;
pub use object::render_object;
pub use permission_set::render_permission_sets;
pub use profile::render_profiles;
pub use validation_rule::render_validation_rules;

use crate::xml::XmlWriter;
use metaforge_ir::{ResolvedFieldPermission, ResolvedObjectPermissions};

/// Write a `<fieldPermissions>` block (elements in metadata order)
pub(crate) fn write_field_permission(xml: &mut XmlWriter, perm: &ResolvedFieldPermission) {
    xml.open("fieldPermissions")
        .element("editable", perm.editable)
        .element("field", &perm.field)
        .element("readable", perm.readable)
        .close();
}

/// Write an `<objectPermissions>` block.
///
/// Flags are alphabetical with `<object>` slotted between
/// `modifyAllRecords` and `viewAllRecords`.
pub(crate) fn write_object_permissions(xml: &mut XmlWriter, perms: &ResolvedObjectPermissions) {
    let entries = perms.permissions.entries();
    let (before, after): (Vec<_>, Vec<_>) = entries.into_iter().partition(|(name, _)| *name < "object");

    xml.open("objectPermissions");
    for (name, value) in before {
        xml.element(name, value);
    }
    xml.element("object", &perms.object);
    for (name, value) in after {
        xml.element(name, value);
    }
    xml.close();
}
