pub mod forms;
pub mod models;
pub mod queries;
pub mod routes;
pub mod views;

use async_trait::async_trait;
use axum::Router;
use locallib_db::DocumentStore;
use locallib_kernel::{InitCtx, Module};

/// The library catalog: authors, books, genres and copies
pub struct CatalogModule;

impl CatalogModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CatalogModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        ctx.store.ping().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ctx.store.backend_name(),
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self, store: DocumentStore) -> Router {
        routes::router(store)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/books/api": {
                    "get": {
                        "summary": "List books with their authors",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "Every book in the catalog",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": { "description": "Document store failure" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string" },
                            "first_name": { "type": "string" },
                            "family_name": { "type": "string" },
                            "date_of_birth": { "type": "string", "format": "date", "nullable": true },
                            "date_of_death": { "type": "string", "format": "date", "nullable": true },
                            "name": { "type": "string" },
                            "lifespan": { "type": "string" },
                            "url": { "type": "string" }
                        },
                        "required": ["_id", "first_name", "family_name", "name", "lifespan", "url"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": {
                                "nullable": true,
                                "allOf": [{ "$ref": "#/components/schemas/Author" }]
                            },
                            "summary": { "type": "string" },
                            "isbn": { "type": "string" },
                            "genre": { "type": "array", "items": { "type": "string" } },
                            "url": { "type": "string" }
                        },
                        "required": ["_id", "title", "summary", "isbn", "genre", "url"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create a new instance of the catalog module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CatalogModule::new())
}
