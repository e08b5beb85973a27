//! HTTP server facade for the local library: router assembly, cross-cutting
//! middleware, the centralized error handler and the serve loop.

use anyhow::Context;
use axum::{routing::get, Router};
use locallib_db::DocumentStore;
use locallib_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

pub use error::AppError;
use router::RouterBuilder;

/// Start the HTTP server and serve until Ctrl-C or SIGTERM
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &Settings,
    store: &DocumentStore,
) -> anyhow::Result<()> {
    let app = build_router(registry, settings, store);

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server shut down gracefully");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
///
/// `/` redirects to the first registered module.
pub fn build_router(registry: &ModuleRegistry, settings: &Settings, store: &DocumentStore) -> Router {
    let mut router_builder = RouterBuilder::new().route("/healthz", get(health_check));

    if let Some(home) = registry.modules().first() {
        router_builder = router_builder.redirect("/", &home.mount_path());
    }

    for module in registry.modules() {
        let mount_path = module.mount_path();
        tracing::info!(module = module.name(), "mounting module routes under {}", mount_path);
        router_builder = router_builder.mount_module(&mount_path, module.routes(store.clone()));
    }

    router_builder
        .with_openapi(registry)
        .with_fallback()
        .with_body_limit(settings.server.body_limit_bytes)
        .with_timeout(settings.server.request_timeout())
        .with_compression()
        .with_security_headers()
        .with_request_id()
        .with_tracing()
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
