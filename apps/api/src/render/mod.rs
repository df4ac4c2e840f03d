pub mod compiler;
pub mod handlers;
pub mod sanitize;
pub mod sections;
pub mod template;

use std::time::Instant;

use tracing::{info, warn};

use crate::models::resume::{Basics, RenderOptions, ResumeDocument};
use crate::state::AppState;
use template::{Template, DEFAULT_TEMPLATE_ID};

/// Produces the complete LaTeX source for `doc` rendered through `template`.
pub fn render_source(template: &Template, doc: &ResumeDocument, options: &RenderOptions) -> String {
    template.fill(&sections::build_slots(doc, options))
}

/// Compiles a throwaway document so the compiler's package bundle is cached
/// before the first real request. Failures are logged and otherwise ignored.
pub async fn warm_up(state: AppState) {
    let Some(template) = state.templates.get(DEFAULT_TEMPLATE_ID) else {
        warn!("Warm-up skipped: template '{DEFAULT_TEMPLATE_ID}' is not loaded");
        return;
    };

    let doc = ResumeDocument {
        basics: Basics {
            name: "Warm Up".to_string(),
            ..Default::default()
        },
        summary: Some("Priming the compiler cache.".to_string()),
        ..Default::default()
    };
    let source = render_source(&template, &doc, &RenderOptions::default());

    let started = Instant::now();
    match state.compiler.compile(&source).await {
        Ok(pdf) => info!(
            "Compiler warm-up finished in {:?} ({} bytes)",
            started.elapsed(),
            pdf.len()
        ),
        Err(e) => warn!("Compiler warm-up failed: {e}"),
    }
}
