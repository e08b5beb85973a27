//! MongoDB backend.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson};
use futures::TryStreamExt;
use mongodb::{options::ClientOptions, Client, Collection, Database};

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use crate::query::{Expr, Query, SortDirection};

/// A backend storing documents in a MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoBackend {
    client: Client,
    database: Database,
}

impl MongoBackend {
    /// Connects to `uri` and verifies the server answers a ping.
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let database = client.database(database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl StoreBackend for MongoBackend {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<bson::Document>> {
        let filter = query.filter.as_ref().map(translate).unwrap_or_default();
        let coll = self.collection(collection);
        let mut action = coll.find(filter);
        if let Some(sort) = &query.sort {
            let direction = match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            let mut spec = bson::Document::new();
            spec.insert(sort.field.clone(), direction);
            action = action.sort(spec);
        }

        let cursor = action.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<bson::Document>> {
        Ok(self.collection(collection).find_one(doc! { "_id": id }).await?)
    }

    async fn count(&self, collection: &str, filter: Option<Expr>) -> StoreResult<u64> {
        let filter = filter.as_ref().map(translate).unwrap_or_default();
        Ok(self.collection(collection).count_documents(filter).await?)
    }

    async fn insert(&self, collection: &str, document: bson::Document) -> StoreResult<()> {
        self.collection(collection).insert_one(document).await?;
        Ok(())
    }

    async fn update_by_id(&self, collection: &str, id: ObjectId, mut document: bson::Document) -> StoreResult<bool> {
        document.remove("_id");
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": document })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<bool> {
        let result = self.collection(collection).delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

/// Translates a filter expression into a MongoDB query document.
fn translate(expr: &Expr) -> bson::Document {
    match expr {
        Expr::Eq(field, value) => {
            let mut filter = bson::Document::new();
            filter.insert(field.clone(), value.clone());
            filter
        }
        Expr::In(field, values) => {
            let mut filter = bson::Document::new();
            filter.insert(field.clone(), doc! { "$in": Bson::Array(values.clone()) });
            filter
        }
        Expr::And(list) => {
            let clauses: Vec<Bson> = list.iter().map(|sub| Bson::Document(translate(sub))).collect();
            doc! { "$and": clauses }
        }
    }
}
