//! `{name}` prompt templates rendered with Handlebars.
//!
//! Placeholders are written `{name}` where `name` is made of ASCII letters,
//! digits and `_` and does not start with a digit. Literal braces are written `{{` and `}}`.
//!
//! At parse time the template is converted to Handlebars syntax: every
//! placeholder becomes `{{name}}`, and literal `{`, `}` and `\` are emitted
//! through the `lbrace`, `rbrace` and `bslash` helpers so they can never form
//! a mustache or an escape.

use docrag_core::{AppError, AppResult};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use std::collections::HashMap;

const TEMPLATE_NAME: &str = "prompt";

/// Handlebars keywords and literals that cannot be used as placeholders.
/// Registered helper names are rejected separately in [`PromptTemplate::parse`].
const RESERVED: [&str; 5] = ["this", "else", "true", "false", "null"];

fn lbrace(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write("{")?;
    Ok(())
}

fn rbrace(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write("}")?;
    Ok(())
}

fn bslash(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write("\\")?;
    Ok(())
}

/// A parsed prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    placeholders: Vec<String>,
    registry: Handlebars<'static>,
}

/// Convert `{name}` syntax to Handlebars source, collecting placeholder names.
fn convert(source: &str) -> AppResult<(String, Vec<String>)> {
    let mut out = String::with_capacity(source.len() + 16);
    let mut placeholders: Vec<String> = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push_str("{{lbrace}}");
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, nc) in chars.by_ref() {
                    match nc {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => break,
                        other => name.push(other),
                    }
                }

                if !closed {
                    return Err(AppError::Prompt(format!(
                        "Unclosed '{{' at byte {} in template",
                        pos
                    )));
                }

                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::Prompt(format!(
                        "Empty placeholder at byte {} in template",
                        pos
                    )));
                }

                let valid_start = name.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '_');
                if !valid_start || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                    return Err(AppError::Prompt(format!(
                        "Invalid placeholder name '{}' (use {{{{ and }}}} for literal braces)",
                        name
                    )));
                }

                if RESERVED.contains(&name) {
                    return Err(AppError::Prompt(format!(
                        "Placeholder name '{}' is reserved",
                        name
                    )));
                }

                if !placeholders.iter().any(|p| p == name) {
                    placeholders.push(name.to_string());
                }
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push_str("{{rbrace}}");
                } else {
                    return Err(AppError::Prompt(format!(
                        "Unmatched '}}' at byte {} in template",
                        pos
                    )));
                }
            }
            '\\' => out.push_str("{{bslash}}"),
            other => out.push(other),
        }
    }

    Ok((out, placeholders))
}

impl PromptTemplate {
    /// Parse a template string and register it with a strict, non-escaping
    /// Handlebars registry.
    ///
    /// # Errors
    /// `AppError::Prompt` for an unmatched `{` or `}`, an empty placeholder
    /// name, a name outside `[A-Za-z_][A-Za-z0-9_]*`, or a name that clashes
    /// with a Handlebars keyword or helper (`if`, `each`, `lbrace`, ...).
    pub fn parse(source: &str) -> AppResult<Self> {
        let (converted, placeholders) = convert(source)?;

        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("lbrace", Box::new(lbrace));
        registry.register_helper("rbrace", Box::new(rbrace));
        registry.register_helper("bslash", Box::new(bslash));

        if let Some(name) = placeholders
            .iter()
            .find(|name| registry.get_helper(name.as_str()).is_some())
        {
            return Err(AppError::Prompt(format!(
                "Placeholder name '{}' is reserved",
                name
            )));
        }

        registry
            .register_template_string(TEMPLATE_NAME, &converted)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            placeholders,
            registry,
        })
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        self.placeholders.iter().map(String::as_str).collect()
    }

    /// Fail unless every name in `names` appears as a placeholder.
    pub fn require(&self, names: &[&str]) -> AppResult<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.placeholders.iter().any(|p| p == name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Prompt(format!(
                "Template is missing placeholders: {}",
                missing
                    .iter()
                    .map(|n| format!("{{{}}}", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Substitute every placeholder.
    ///
    /// Values are inserted verbatim; braces inside values are not
    /// interpreted.
    pub fn render(&self, values: &HashMap<&str, &str>) -> AppResult<String> {
        if let Some(name) = self
            .placeholders
            .iter()
            .find(|p| !values.contains_key(p.as_str()))
        {
            return Err(AppError::Prompt(format!(
                "No value for placeholder {{{}}}",
                name
            )));
        }

        let out = self
            .registry
            .render(TEMPLATE_NAME, values)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        tracing::trace!(chars = out.len(), "Rendered prompt template");
        Ok(out)
    }
}
