use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::RenderRequest;
use crate::render::render_source;
use crate::state::AppState;
use crate::validation::validate_request;

const FALLBACK_FILENAME: &str = "resume";

#[derive(Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<String>,
}

/// POST /render
///
/// Validation runs before anything touches the compiler; an invalid payload
/// never spawns a process.
pub async fn handle_render(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let template = validate_request(&req, &state.templates).map_err(AppError::Validation)?;

    let render_id = Uuid::new_v4();
    let span = info_span!("render", %render_id, template = template.id());

    async move {
        let options = req.options.clone().unwrap_or_default();
        let source = render_source(&template, &req.data, &options);

        let started = Instant::now();
        let pdf = state.compiler.compile(&source).await?;
        info!(
            "Rendered {} byte PDF in {:?}",
            pdf.len(),
            started.elapsed()
        );

        let disposition = format!(
            "inline; filename=\"{}.pdf\"",
            filename_stem(&req.data.basics.name)
        );
        Ok::<_, AppError>((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            pdf,
        )
            .into_response())
    }
    .instrument(span)
    .await
}

/// GET /templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Json<TemplateListResponse> {
    Json(TemplateListResponse {
        templates: state.templates.ids().into_iter().map(String::from).collect(),
    })
}

/// ASCII-only file name derived from the person's name, safe for a quoted
/// header parameter.
fn filename_stem(name: &str) -> String {
    let mut stem = String::new();
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{stem}_{FALLBACK_FILENAME}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_stem() {
        assert_eq!(filename_stem("Jane Q. Doe"), "jane_q_doe_resume");
        assert_eq!(filename_stem("  José  "), "jos_resume");
        assert_eq!(filename_stem("李雷"), "resume");
        assert_eq!(filename_stem("\"; rm -rf"), "rm_rf_resume");
    }
}
