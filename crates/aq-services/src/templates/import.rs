//! Preparing templates for (re-)import
//!
//! Uploaded and forked templates still carry the identity they had in the
//! store they came from. It is stripped before adding them, and a free name
//! is found by appending a counter.

use aq_models::Template;
use once_cell::sync::Lazy;
use regex::Regex;

/// Number of numbered names tried before giving up
pub const MAX_NAME_ATTEMPTS: usize = 100;

/// Layout key pointing a fork at the template it was copied from
pub const BASE_TEMPLATE_KEY: &str = "base_template_id";

static NUMBERED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<base>.*\S) \((?P<n>\d+)\)$").unwrap());

/// Strip store identity so the template can be added as new
///
/// Attribute ids are global and survive.
pub fn prepare_for_import(template: &mut Template) {
    template.detach();
}

/// Turn a stored template into a fork of itself
///
/// Named attributes are re-resolved by the store, unnamed ones keep their id.
pub fn fork_template(template: &mut Template) {
    let base_template_id = template.id;
    template.detach();
    for ta in template
        .templatetypes
        .iter_mut()
        .flat_map(|tt| tt.typeattrs.iter_mut())
    {
        if ta.attr_name.is_some() {
            ta.attr_id = None;
        }
    }
    if let Some(id) = base_template_id {
        template
            .layout
            .insert(BASE_TEMPLATE_KEY.to_string(), id.into());
    }
}

/// The name without a trailing ` (n)` counter
pub fn base_name(name: &str) -> &str {
    NUMBERED_NAME
        .captures(name)
        .and_then(|caps| caps.name("base"))
        .map(|m| m.as_str())
        .unwrap_or(name)
}

/// Candidate names: the original, then `"{base} (1)"` .. `"{base} (100)"`
pub fn candidate_names(name: &str) -> impl Iterator<Item = String> + '_ {
    let base = base_name(name);
    std::iter::once(name.to_string())
        .chain((1..=MAX_NAME_ATTEMPTS).map(move |i| format!("{base} ({i})")))
}
