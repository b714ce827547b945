//! Prompt templates bundled into the binary at compile time.

use std::fs;
use std::path::Path;

use crate::config;
use crate::error::{Error, Result};

static TEMPLATES: &[(&str, &str)] = &[
    ("debug", include_str!("../templates/debug.md")),
    ("plan", include_str!("../templates/plan.md")),
    ("review", include_str!("../templates/review.md")),
];

/// Names of all bundled templates, sorted.
pub fn list_templates() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TEMPLATES.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    names
}

/// Load a bundled template by name. A trailing `.md` on the name is
/// accepted and ignored.
pub fn load_template(name: &str) -> Result<&'static str> {
    let name = if name.ends_with(".md") {
        &name[..name.len() - 3]
    } else {
        name
    };

    TEMPLATES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, content)| *content)
        .ok_or_else(|| Error::TemplateNotFound(String::from(name), list_templates()))
}

/// Replace the region between the template's context markers with the
/// content of `context_file`. The markers themselves are kept.
pub fn inject_context(template: &str, context_file: &Path) -> Result<String> {
    let begin = template.find(config::CONTEXT_BEGIN_MARKER);
    let end = template.find(config::CONTEXT_END_MARKER);
    let (begin, end) = match (begin, end) {
        (Some(begin), Some(end)) if begin <= end => (begin, end),
        _ => {
            return Err(Error::Template(format!(
                "Template does not contain required markers for context injection: \
                 {} and {}",
                config::CONTEXT_BEGIN_MARKER,
                config::CONTEXT_END_MARKER
            )));
        }
    };

    let context = fs::read_to_string(context_file).map_err(|err| {
        Error::Template(format!(
            "Failed to read context file {}: {}",
            context_file.display(),
            err
        ))
    })?;

    let mut injected = String::with_capacity(template.len() + context.len());
    injected.push_str(&template[..begin]);
    injected.push_str(config::CONTEXT_BEGIN_MARKER);
    injected.push('\n');
    injected.push_str(&context);
    injected.push('\n');
    injected.push_str(config::CONTEXT_END_MARKER);
    injected.push_str(&template[end + config::CONTEXT_END_MARKER.len()..]);

    Ok(injected)
}
