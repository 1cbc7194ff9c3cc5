//! Catch-all type for resources with no counterpart in the new template

use aq_core::{Id, ResourceKind};
use aq_models::TemplateType;

pub const UNKNOWN_TYPE_NAME: &str = "UNKNOWN";

/// Red circle icon so the UI can flag resources needing attention
pub const UNKNOWN_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 15 15" height="15" width="15"><title>circle-15.svg</title><rect fill="none" x="0" y="0" width="15" height="15"></rect><path fill="red" transform="translate(0 0)" d="M14,7.5c0,3.5899-2.9101,6.5-6.5,6.5S1,11.0899,1,7.5S3.9101,1,7.5,1S14,3.9101,14,7.5z"></path></svg>"#;

/// Definition of the UNKNOWN type for one resource kind, ready to be added
pub fn unknown_type(kind: ResourceKind, template_id: Id) -> TemplateType {
    let mut tt = TemplateType::new(UNKNOWN_TYPE_NAME, kind).with_layout("svg", UNKNOWN_SVG.into());
    tt.template_id = Some(template_id);
    tt
}
