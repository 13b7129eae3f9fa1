//! Prompt template rendering.
//!
//! Supports `{{variable}}` substitution and `{{#if variable}}..{{else}}..{{/if}}`
//! blocks (not nested). Unknown placeholders render as empty text.

use rmcp::model::PromptArgument;
use std::collections::HashMap;

use super::error::PromptError;

const IF_OPEN: &str = "{{#if ";
const ELSE: &str = "{{else}}";
const IF_CLOSE: &str = "{{/if}}";

/// A prompt template that can be instantiated with arguments.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<PromptArgument>,
    pub template: String,
}

/// True when the argument is present and not blank.
fn is_set(arguments: &HashMap<String, String>, name: &str) -> bool {
    arguments.get(name).is_some_and(|v| !v.trim().is_empty())
}

impl PromptTemplate {
    /// Render the template with the given arguments.
    pub fn render(&self, arguments: &HashMap<String, String>) -> Result<String, PromptError> {
        let resolved = resolve_conditionals(&self.template, arguments)?;
        Ok(substitute(&resolved, arguments))
    }
}

fn resolve_conditionals(
    template: &str,
    arguments: &HashMap<String, String>,
) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(IF_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + IF_OPEN.len()..];
        let name_end = after_open
            .find("}}")
            .ok_or_else(|| PromptError::template("Unclosed {{#if}} tag"))?;
        let name = after_open[..name_end].trim();
        let body_and_rest = &after_open[name_end + 2..];
        let close = body_and_rest
            .find(IF_CLOSE)
            .ok_or_else(|| PromptError::template(format!("Missing {{{{/if}}}} for '{name}'")))?;

        let body = &body_and_rest[..close];
        let (then_part, else_part) = body.split_once(ELSE).unwrap_or((body, ""));
        out.push_str(if is_set(arguments, name) {
            then_part
        } else {
            else_part
        });

        rest = &body_and_rest[close + IF_CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

fn substitute(template: &str, arguments: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = rest[start + 2..start + end].trim();
        if let Some(value) = arguments.get(name) {
            out.push_str(value.trim());
        }
        rest = &rest[start + end + 2..];
    }
    out.push_str(rest);
    out
}
