//! The storage backend abstraction.

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::error::StoreResult;
use crate::query::{Expr, Query};

/// A storage backend operating on raw BSON documents.
///
/// Backends are addressed by collection name. Typed access goes through
/// [`crate::TypedCollection`], which handles (de)serialization.
#[async_trait]
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Returns a short name identifying the backend in logs.
    fn name(&self) -> &'static str;

    /// Returns every document in `collection` matching `query`.
    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<bson::Document>>;

    /// Returns the document with the given `_id`, if present.
    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<bson::Document>>;

    /// Counts documents in `collection` matching `filter` (all when `None`).
    async fn count(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64>;

    /// Inserts a document. The document must carry an `_id`.
    async fn insert(&self, collection: &str, document: bson::Document) -> StoreResult<()>;

    /// Overwrites the fields present in `document` on the stored document with
    /// the given `_id`. Fields absent from `document` keep their stored value.
    ///
    /// Returns `false` when no document has that id.
    async fn update_by_id(&self, collection: &str, id: ObjectId, document: bson::Document) -> StoreResult<bool>;

    /// Removes the document with the given `_id`.
    ///
    /// Returns `false` when no document had that id; this is not an error.
    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<bool>;

    /// Verifies the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Releases backend resources.
    async fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }
}
