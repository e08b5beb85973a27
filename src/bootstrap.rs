//! Process lifecycle: connect the store, run modules, serve, tear down.

use anyhow::Context;
use axum::Router;
use locallib_db::DocumentStore;
use locallib_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry holding every application module.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// The full HTTP application over an already connected store.
pub fn router(settings: &Settings, store: &DocumentStore) -> Router {
    locallib_http::build_router(&registry(), settings, store)
}

/// Run the server until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    locallib_http::error::configure(settings.environment);

    let store = locallib_db::connect(&settings.database.connect_options())
        .await
        .context("failed to connect to the document store")?;

    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = locallib_http::start_server(&registry, &settings, &store).await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "HTTP server stopped with an error");
    }

    registry.stop_modules().await?;
    store
        .shutdown()
        .await
        .context("failed to close the document store")?;

    tracing::info!("locallib-app shut down");
    served
}
