//! The trait every persisted entity implements, plus BSON conversion helpers.

use bson::{de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson, Bson};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{StoreError, StoreResult};

/// A persisted entity with a stable identifier.
///
/// Implementors serialize their identifier under the `_id` key:
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Genre {
///     #[serde(rename = "_id")]
///     pub id: ObjectId,
///     pub name: String,
/// }
///
/// impl Document for Genre {
///     fn id(&self) -> &ObjectId { &self.id }
///     fn collection_name() -> &'static str { "genres" }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns this document's identifier.
    fn id(&self) -> &ObjectId;

    /// Returns the name of the collection holding documents of this type.
    fn collection_name() -> &'static str;
}

/// Serializes a value into a BSON document.
pub fn to_bson_document<T: Serialize + ?Sized>(value: &T) -> StoreResult<bson::Document> {
    match serialize_to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(StoreError::Serialization(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Deserializes a BSON document into a typed value.
pub fn from_bson_document<T: DeserializeOwned>(doc: bson::Document) -> StoreResult<T> {
    Ok(deserialize_from_bson(Bson::Document(doc))?)
}

/// Reads the `_id` of a stored document.
pub fn document_id(doc: &bson::Document) -> Option<ObjectId> {
    match doc.get("_id") {
        Some(Bson::ObjectId(id)) => Some(*id),
        _ => None,
    }
}
