mod config;
mod errors;
mod models;
mod render;
mod routes;
mod state;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::render::compiler::TectonicCompiler;
use crate::render::template::TemplateRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume render service v{}", env!("CARGO_PKG_VERSION"));

    // Templates are parsed once; a broken template file stops startup.
    let templates = TemplateRegistry::load(config.template_dir.as_deref())
        .context("failed to load templates")?;
    info!("Templates available: {}", templates.ids().join(", "));

    std::fs::create_dir_all(&config.work_dir).with_context(|| {
        format!("cannot create work dir {}", config.work_dir.display())
    })?;
    let compiler = TectonicCompiler::new(
        config.tectonic_bin.clone(),
        config.render_timeout,
        config.work_dir.clone(),
    );
    info!(
        "Compiler: {} (timeout {:?}, work dir {})",
        config.tectonic_bin.display(),
        config.render_timeout,
        config.work_dir.display()
    );

    let state = AppState {
        templates: Arc::new(templates),
        compiler: Arc::new(compiler),
    };

    if config.warm_up {
        tokio::spawn(render::warm_up(state.clone()));
    }

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
