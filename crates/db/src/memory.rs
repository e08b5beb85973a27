//! In-memory backend used for local development and tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson};
use tokio::sync::RwLock;

use crate::backend::StoreBackend;
use crate::document::document_id;
use crate::error::{StoreError, StoreResult};
use crate::query::{Expr, Query, SortDirection};

/// Documents of one collection, keyed by `_id` and kept in insertion order.
#[derive(Debug, Default)]
struct Collection {
    order: Vec<ObjectId>,
    documents: BTreeMap<ObjectId, bson::Document>,
}

/// A thread-safe in-memory document backend.
///
/// Clones share the same underlying data.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<bson::Document>> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<bson::Document> = coll
            .order
            .iter()
            .filter_map(|id| coll.documents.get(id))
            .filter(|doc| query.filter.as_ref().is_none_or(|expr| matches(expr, doc)))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            results.sort_by(|a, b| {
                let ordering = compare_bson(a.get(&sort.field), b.get(&sort.field));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(results)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<bson::Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|coll| coll.documents.get(&id))
            .cloned())
    }

    async fn count(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(0);
        };
        let count = coll
            .documents
            .values()
            .filter(|doc| filter.as_ref().is_none_or(|expr| matches(expr, doc)))
            .count();
        Ok(count as u64)
    }

    async fn insert(&self, collection: &str, document: bson::Document) -> StoreResult<()> {
        let id = document_id(&document)
            .ok_or_else(|| StoreError::Backend(format!("document in '{collection}' has no _id")))?;

        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.documents.contains_key(&id) {
            return Err(StoreError::Backend(format!(
                "duplicate key {id} in collection '{collection}'"
            )));
        }
        coll.order.push(id);
        coll.documents.insert(id, document);
        Ok(())
    }

    async fn update_by_id(&self, collection: &str, id: ObjectId, document: bson::Document) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections
            .get_mut(collection)
            .and_then(|coll| coll.documents.get_mut(&id))
        else {
            return Ok(false);
        };

        for (key, value) in document {
            if key != "_id" {
                stored.insert(key, value);
            }
        }
        Ok(true)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let removed = coll.documents.remove(&id).is_some();
        if removed {
            coll.order.retain(|existing| *existing != id);
        }
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn matches(expr: &Expr, doc: &bson::Document) -> bool {
    match expr {
        Expr::Eq(field, value) => field_contains(doc.get(field), value),
        Expr::In(field, values) => values.iter().any(|value| field_contains(doc.get(field), value)),
        Expr::And(list) => list.iter().all(|sub| matches(sub, doc)),
    }
}

/// Equality with array fields matching when any element is equal, the way a
/// document database treats `{ field: value }` against an array.
fn field_contains(field: Option<&Bson>, value: &Bson) -> bool {
    match field {
        Some(Bson::Array(items)) => items.iter().any(|item| item == value),
        Some(actual) => actual == value,
        None => matches!(value, Bson::Null),
    }
}

fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None | Some(Bson::Null), None | Some(Bson::Null)) => Ordering::Equal,
        (None | Some(Bson::Null), _) => Ordering::Less,
        (_, None | Some(Bson::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Bson::String(a), Bson::String(b)) => a.cmp(b),
            (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
            (Bson::ObjectId(a), Bson::ObjectId(b)) => a.cmp(b),
            (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
            _ => match (as_number(a), as_number(b)) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        },
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use bson::doc;

    async fn seeded() -> (MemoryBackend, ObjectId, ObjectId) {
        let backend = MemoryBackend::new();
        let first = ObjectId::new();
        let second = ObjectId::new();
        backend
            .insert("books", doc! { "_id": first, "title": "Persuasion", "genre": [ "a", "b" ] })
            .await
            .unwrap();
        backend
            .insert("books", doc! { "_id": second, "title": "Emma", "genre": [ "b" ] })
            .await
            .unwrap();
        (backend, first, second)
    }

    #[tokio::test]
    async fn find_keeps_insertion_order_without_sort() {
        let (backend, first, second) = seeded().await;
        let docs = backend.find("books", Query::new()).await.unwrap();
        let ids: Vec<_> = docs.iter().filter_map(document_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn find_sorts_by_field() {
        let (backend, _, _) = seeded().await;
        let query = Query::builder().sort("title", SortDirection::Asc).build();
        let docs = backend.find("books", query).await.unwrap();
        let titles: Vec<_> = docs.iter().map(|d| d.get_str("title").unwrap()).collect();
        assert_eq!(titles, vec!["Emma", "Persuasion"]);
    }

    #[tokio::test]
    async fn eq_matches_array_elements() {
        let (backend, _, _) = seeded().await;
        assert_eq!(backend.count("books", Some(Filter::eq("genre", "b"))).await.unwrap(), 2);
        assert_eq!(backend.count("books", Some(Filter::eq("genre", "a"))).await.unwrap(), 1);
        assert_eq!(backend.count("books", Some(Filter::eq("genre", "z"))).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn any_of_matches_listed_ids() {
        let (backend, first, _) = seeded().await;
        let docs = backend
            .find("books", Query::filtered(Filter::any_of("_id", [first])))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("title").unwrap(), "Persuasion");
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let (backend, first, _) = seeded().await;
        let err = backend
            .insert("books", doc! { "_id": first, "title": "Again" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn update_merges_fields_and_keeps_absent_ones() {
        let (backend, first, _) = seeded().await;
        let updated = backend
            .update_by_id("books", first, doc! { "_id": first, "title": "Sanditon" })
            .await
            .unwrap();
        assert!(updated);

        let stored = backend.find_by_id("books", first).await.unwrap().unwrap();
        assert_eq!(stored.get_str("title").unwrap(), "Sanditon");
        assert!(stored.get_array("genre").is_ok());
    }

    #[tokio::test]
    async fn update_of_missing_document_reports_false() {
        let backend = MemoryBackend::new();
        let updated = backend
            .update_by_id("books", ObjectId::new(), doc! { "title": "x" })
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (backend, first, _) = seeded().await;
        assert!(backend.delete_by_id("books", first).await.unwrap());
        assert!(!backend.delete_by_id("books", first).await.unwrap());
        assert_eq!(backend.count("books", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_collection_is_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.find("nothing", Query::new()).await.unwrap().is_empty());
        assert_eq!(backend.count("nothing", None).await.unwrap(), 0);
    }
}
