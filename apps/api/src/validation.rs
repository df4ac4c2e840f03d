//! Turns `validator` reports into a flat map of JSON field paths to messages.

use std::collections::BTreeMap;
use std::sync::Arc;

use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::resume::RenderRequest;
use crate::render::template::{Template, TemplateRegistry};

/// Dotted JSON path (`data.experience[0].startDate`) → human-readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Validates a render request, including that the selected template exists,
/// and hands back that template.
pub fn validate_request(
    req: &RenderRequest,
    templates: &TemplateRegistry,
) -> Result<Arc<Template>, FieldErrors> {
    let mut errors = match req.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => flatten(&e),
    };

    let template = if req.template_id.trim().is_empty() {
        errors
            .entry("templateId".to_string())
            .or_default()
            .push("is required".to_string());
        None
    } else {
        let found = templates.get(&req.template_id);
        if found.is_none() {
            errors.entry("templateId".to_string()).or_default().push(format!(
                "unknown template '{}' (available: {})",
                req.template_id,
                templates.ids().join(", ")
            ));
        }
        found
    };

    match template {
        Some(template) if errors.is_empty() => Ok(template),
        _ => Err(errors),
    }
}

pub fn flatten(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect("", errors, &mut out);
    out
}

fn collect(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = camel_case(&field.to_string());
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.entry(path)
                    .or_default()
                    .extend(list.iter().map(describe));
            }
            ValidationErrorsKind::Struct(nested) => collect(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' check", error.code),
    }
}

/// Rust field names are snake_case; the wire format is camelCase.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
