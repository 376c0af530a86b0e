//! Deployment manifest (`manifest/package.xml`)
//!
//! The manifest names the custom object only; in source format its fields
//! and validation rules deploy with it. Profiles and permission sets are
//! deployed from their source directories instead.

use crate::context::RenderContext;
use crate::xml::XmlWriter;
use crate::{ArtifactKind, GeneratedFile};

pub fn render_manifest(ctx: &RenderContext<'_>) -> GeneratedFile {
    let mut xml = XmlWriter::new("Package");
    xml.open("types")
        .element("members", ctx.object_id())
        .element("name", "CustomObject")
        .close()
        .element("version", ctx.api_version());

    GeneratedFile::new(ctx.manifest_path(), xml.finish(), ArtifactKind::Manifest)
}
