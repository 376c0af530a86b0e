//! Profile access (`<Profile>`)
//!
//! Profiles are partial: only the field-level security, object permissions
//! and user permissions from the draft are written, and deploying them
//! merges into the existing profile.

use metaforge_ir::ResolvedProfile;

use crate::context::RenderContext;
use crate::metadata::{write_field_permission, write_object_permissions};
use crate::xml::XmlWriter;
use crate::{ArtifactKind, GeneratedFile};

/// Render one file per configured profile
pub fn render_profiles(ctx: &RenderContext<'_>) -> Vec<GeneratedFile> {
    ctx.schema()
        .profiles
        .iter()
        .map(|profile| {
            GeneratedFile::new(
                ctx.profile_path(&profile.file_stem),
                render_profile(profile),
                ArtifactKind::Profile,
            )
        })
        .collect()
}

pub fn render_profile(profile: &ResolvedProfile) -> String {
    let mut xml = XmlWriter::new("Profile");

    for perm in &profile.field_permissions {
        write_field_permission(&mut xml, perm);
    }

    if let Some(perms) = &profile.object_permissions {
        write_object_permissions(&mut xml, perms);
    }

    for perm in &profile.user_permissions {
        xml.open("userPermissions")
            .element("enabled", perm.enabled)
            .element("name", &perm.name)
            .close();
    }

    xml.finish()
}
