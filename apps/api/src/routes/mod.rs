pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::render::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/templates", get(handlers::handle_list_templates))
        .route("/render", post(handlers::handle_render))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use bytes::Bytes;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::render::compiler::{Compiler, RenderError};
    use crate::render::template::TemplateRegistry;

    const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

    /// Records every source it is handed.
    #[derive(Default)]
    struct FakeCompiler {
        fail: bool,
        sources: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Compiler for FakeCompiler {
        async fn compile(&self, source: &str) -> Result<Bytes, RenderError> {
            self.sources.lock().unwrap().push(source.to_string());
            if self.fail {
                Err(RenderError::Failed {
                    status: "exit status: 1".to_string(),
                })
            } else {
                Ok(Bytes::from_static(FAKE_PDF))
            }
        }
    }

    fn app(compiler: Arc<FakeCompiler>) -> Router {
        build_router(AppState {
            templates: Arc::new(TemplateRegistry::builtin().unwrap()),
            compiler,
        })
    }

    async fn post_render(app: Router, body: impl Into<Body>) -> Response {
        app.oneshot(
            Request::post("/render")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_request() -> Value {
        json!({
            "templateId": "sb2nov",
            "options": { "color": "#1F6FEB", "sectionOrder": ["skills"] },
            "data": {
                "basics": {
                    "name": "Jane Doe",
                    "email": "jane@example.com",
                    "links": [{ "label": "GitHub", "url": "https://github.com/jane" }]
                },
                "experience": [{
                    "company": "R&D Labs",
                    "position": "Engineer",
                    "startDate": "2021-03",
                    "endDate": null,
                    "bullets": ["Cut costs by 40%"]
                }],
                "skills": { "groups": [{ "label": "Languages", "items": ["Rust", "C#"] }] }
            }
        })
    }

    #[tokio::test]
    async fn test_render_returns_pdf() {
        let compiler = Arc::new(FakeCompiler::default());
        let response = post_render(app(compiler.clone()), sample_request().to_string()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"jane_doe_resume.pdf\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], FAKE_PDF);

        let sources = compiler.sources.lock().unwrap();
        assert_eq!(sources.len(), 1);
        let source = &sources[0];
        assert!(source.contains(r"R\&D Labs"));
        assert!(source.contains(r"40\%"));
        assert!(source.contains(r"C\#"));
        assert!(source.contains("Mar 2021 -- Present"));
        assert!(source.contains(r"\definecolor{accent}{HTML}{1F6FEB}"));
        assert!(source.contains(r"\href{mailto:jane@example.com}"));
        // Skills requested first.
        let skills = source.find(r"\section{Skills}").unwrap();
        let experience = source.find(r"\section{Experience}").unwrap();
        assert!(skills < experience);
    }

    #[tokio::test]
    async fn test_template_id_is_case_insensitive() {
        let compiler = Arc::new(FakeCompiler::default());
        let mut req = sample_request();
        req["templateId"] = json!("SB2NOV");

        let response = post_render(app(compiler.clone()), req.to_string()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(compiler.sources.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_name_is_rejected_before_compiling() {
        let compiler = Arc::new(FakeCompiler::default());
        let mut req = sample_request();
        req["data"]["basics"]
            .as_object_mut()
            .unwrap()
            .remove("name");

        let response = post_render(app(compiler.clone()), req.to_string()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Invalid payload");
        assert!(body["error"]["details"]["data.basics.name"].is_array());
        assert!(compiler.sources.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_only_required_fields_are_rejected_before_compiling() {
        let compiler = Arc::new(FakeCompiler::default());
        let req = json!({
            "templateId": "sb2nov",
            "data": {
                "basics": { "name": "   " },
                "experience": [{
                    "company": " ",
                    "position": " ",
                    "startDate": " ",
                    "endDate": null
                }]
            }
        });

        let response = post_render(app(compiler.clone()), req.to_string()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let details = &body["error"]["details"];
        for path in [
            "data.basics.name",
            "data.experience[0].company",
            "data.experience[0].position",
            "data.experience[0].startDate",
        ] {
            assert_eq!(details[path][0], "is required", "{path}");
        }
        assert!(compiler.sources.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_field_errors_are_reported_by_path() {
        let compiler = Arc::new(FakeCompiler::default());
        let mut req = sample_request();
        req["data"]["basics"]["email"] = json!("not-an-email");
        req["data"]["experience"][0]
            .as_object_mut()
            .unwrap()
            .remove("startDate");

        let response = post_render(app(compiler.clone()), req.to_string()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let details = &body["error"]["details"];
        assert!(details["data.basics.email"].is_array());
        assert!(details["data.experience[0].startDate"].is_array());
        assert!(compiler.sources.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_template_is_rejected() {
        let compiler = Arc::new(FakeCompiler::default());
        let mut req = sample_request();
        req["templateId"] = json!("modern");

        let response = post_render(app(compiler.clone()), req.to_string()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let details = &body["error"]["details"];
        let message = details["templateId"][0].as_str().unwrap();
        assert!(message.contains("modern"), "{message}");
        assert!(compiler.sources.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let compiler = Arc::new(FakeCompiler::default());

        let response = post_render(app(compiler.clone()), "{\"templateId\": ").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["details"]["body"].is_array());
        assert!(compiler.sources.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compiler_failure_is_opaque_500() {
        let compiler = Arc::new(FakeCompiler {
            fail: true,
            ..Default::default()
        });

        let response = post_render(app(compiler.clone()), sample_request().to_string()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "RENDER_FAILED");
        assert_eq!(body["error"]["message"], "Render failed");
        assert_eq!(compiler.sources.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(FakeCompiler::default()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-render");
    }

    #[tokio::test]
    async fn test_list_templates() {
        let response = app(Arc::new(FakeCompiler::default()))
            .oneshot(Request::get("/templates").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "templates": ["sb2nov"] }));
    }
}
