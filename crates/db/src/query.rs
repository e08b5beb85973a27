//! Filter expressions and sort specifications.
//!
//! ```ignore
//! use locallib_db::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("author", author_id))
//!     .sort("family_name", SortDirection::Asc)
//!     .build();
//! ```

use bson::Bson;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Single-field sort specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// A filter expression over top-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The field equals the value.
    Eq(String, Bson),
    /// The field equals one of the values.
    In(String, Vec<Bson>),
    /// Every sub-expression matches.
    And(Vec<Expr>),
}

impl Expr {
    /// Combines this expression with another using logical AND.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }
}

/// Constructors for common filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::Eq(field.into(), value.into())
    }

    /// Matches documents where `field` equals any of `values`.
    pub fn any_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Matches documents satisfying all of `exprs`.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }
}

/// A structured query: optional filter plus optional sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub sort: Option<Sort>,
}

impl Query {
    /// A query matching every document in insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query matching `filter`, unsorted.
    pub fn filtered(filter: Expr) -> Self {
        Self {
            filter: Some(filter),
            sort: None,
        }
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}
