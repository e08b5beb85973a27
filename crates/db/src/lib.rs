//! Document store for the local library catalog.
//!
//! The store is a process-wide resource: it is connected once at startup with
//! [`connect`], cloned into every request handler, and closed with
//! [`DocumentStore::shutdown`] when the process exits.
//!
//! - **Documents** ([`document`]) - the [`Document`] trait implemented by every entity
//! - **Queries** ([`query`]) - filter expressions and sort specifications
//! - **Backends** ([`backend`]) - the [`StoreBackend`] trait plus the in-memory
//!   and MongoDB implementations
//! - **Store** ([`store`]) - the shared handle and typed collections

pub mod backend;
pub mod document;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod query;
pub mod store;

pub use backend::StoreBackend;
pub use bson::oid::ObjectId;
pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use mongo::MongoBackend;
pub use query::{Expr, Filter, Query, SortDirection};
pub use store::{connect, ConnectOptions, DocumentStore, TypedCollection};
