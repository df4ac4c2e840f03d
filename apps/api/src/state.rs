use std::sync::Arc;

use crate::render::compiler::Compiler;
use crate::render::template::TemplateRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup; read-only afterwards.
    pub templates: Arc<TemplateRegistry>,
    /// Default: TectonicCompiler. Tests swap in a fake.
    pub compiler: Arc<dyn Compiler>,
}
