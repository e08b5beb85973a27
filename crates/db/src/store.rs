//! The shared store handle, typed collections and connection setup.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use bson::oid::ObjectId;
use tracing::{error, info};

use crate::backend::StoreBackend;
use crate::document::{from_bson_document, to_bson_document, Document};
use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryBackend;
use crate::mongo::MongoBackend;
use crate::query::{Expr, Filter, Query};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// A cloneable handle to the connected document store.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StoreBackend>,
}

impl DocumentStore {
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// A fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Typed access to the collection holding `D`.
    pub fn collection<D: Document>(&self) -> TypedCollection<'_, D> {
        TypedCollection {
            backend: self.backend.as_ref(),
            _marker: PhantomData,
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.backend.ping().await
    }

    pub async fn shutdown(&self) -> StoreResult<()> {
        info!(backend = self.backend.name(), "closing document store");
        self.backend.shutdown().await
    }
}

/// Typed view over one collection.
pub struct TypedCollection<'a, D> {
    backend: &'a dyn StoreBackend,
    _marker: PhantomData<D>,
}

impl<D: Document> TypedCollection<'_, D> {
    pub async fn find_all(&self, query: Query) -> StoreResult<Vec<D>> {
        self.backend
            .find(D::collection_name(), query)
            .await?
            .into_iter()
            .map(from_bson_document)
            .collect()
    }

    /// Returns the first document matching `filter`.
    pub async fn find_one(&self, filter: Expr) -> StoreResult<Option<D>> {
        let mut matches = self.find_all(Query::filtered(filter)).await?;
        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(0)))
        }
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<D>> {
        self.backend
            .find_by_id(D::collection_name(), *id)
            .await?
            .map(from_bson_document)
            .transpose()
    }

    /// Returns the documents whose ids appear in `ids`. Unknown ids are skipped.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<D>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_all(Query::filtered(Filter::any_of("_id", ids.iter().copied())))
            .await
    }

    pub async fn count(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.backend.count(D::collection_name(), filter).await
    }

    pub async fn insert(&self, document: &D) -> StoreResult<()> {
        self.backend
            .insert(D::collection_name(), to_bson_document(document)?)
            .await
    }

    /// Writes the fields of `document` over the stored document with `id`.
    ///
    /// Returns `false` when nothing was stored under `id`.
    pub async fn update_by_id(&self, id: &ObjectId, document: &D) -> StoreResult<bool> {
        self.backend
            .update_by_id(D::collection_name(), *id, to_bson_document(document)?)
            .await
    }

    /// Removes the document with `id`. Returns `false` when it was already absent.
    pub async fn delete_by_id(&self, id: &ObjectId) -> StoreResult<bool> {
        self.backend.delete_by_id(D::collection_name(), *id).await
    }
}

/// Parameters for establishing the store connection.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// `memory://` for the in-process backend, or a `mongodb://` /
    /// `mongodb+srv://` connection string.
    pub endpoint: String,
    pub database: String,
    pub attempts: u32,
    pub retry_delay: Duration,
}

enum Endpoint<'a> {
    Memory,
    Mongo(&'a str),
}

fn parse_endpoint(endpoint: &str) -> StoreResult<Endpoint<'_>> {
    if endpoint == "memory" || endpoint.starts_with("memory://") {
        Ok(Endpoint::Memory)
    } else if endpoint.starts_with("mongodb://") || endpoint.starts_with("mongodb+srv://") {
        Ok(Endpoint::Mongo(endpoint))
    } else {
        Err(StoreError::InvalidEndpoint(endpoint.to_string()))
    }
}

/// Connects to the configured store, retrying with exponential backoff.
pub async fn connect(options: &ConnectOptions) -> StoreResult<DocumentStore> {
    let uri = match parse_endpoint(&options.endpoint)? {
        Endpoint::Memory => {
            info!("using in-memory document store");
            return Ok(DocumentStore::in_memory());
        }
        Endpoint::Mongo(uri) => uri,
    };

    let attempts = options.attempts.max(1);
    let mut delay = options.retry_delay;

    for attempt in 1..=attempts {
        match MongoBackend::connect(uri, &options.database).await {
            Ok(backend) => {
                info!(database = %options.database, attempt, "connected to document store");
                return Ok(DocumentStore::new(backend));
            }
            Err(e) if attempt < attempts => {
                error!(
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "document store connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_RETRY_DELAY);
            }
            Err(e) => {
                error!(attempts, error = %e, "could not connect to document store");
                return Err(e);
            }
        }
    }

    Err(StoreError::Connection("no connection attempts were made".to_string()))
}
