use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tablechat::{backend, cli, config::Config, pipeline::Analyzer, sandbox::python::PythonSandbox, server};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // CLI flags override config through the environment, before load
    if let Some(v) = &args.host {
        std::env::set_var("HOST", v);
    }
    if let Some(v) = args.port {
        std::env::set_var("PORT", v.to_string());
    }
    if let Some(v) = &args.backend {
        std::env::set_var("MODEL_BACKEND", v);
    }
    if let Some(v) = &args.model {
        std::env::set_var("DEFAULT_MODEL", v);
    }
    if let Some(v) = &args.python_bin {
        std::env::set_var("PYTHON_BIN", v);
    }
    if let Some(v) = args.exec_timeout {
        std::env::set_var("EXEC_TIMEOUT", v.to_string());
    }
    if let Some(v) = &args.allow_origin {
        std::env::set_var("ALLOWED_ORIGIN", v);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::load();

    // missing credentials are fatal here, never per-request
    let backend = backend::from_config(&cfg)?;
    info!(backend = backend.name(), "model backend ready");

    let sandbox = Arc::new(PythonSandbox::from_config(&cfg));
    let analyzer = Arc::new(Analyzer::new(backend, sandbox));
    let state = server::AppState::new(analyzer, cfg.allowed_origin());

    server::serve(&cfg.bind_addr(), state).await
}
