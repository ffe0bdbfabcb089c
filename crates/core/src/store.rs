use async_trait::async_trait;
use thiserror::Error;

use crate::domain::customer::{Customer, CustomerId, NewCustomer};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or other constraint rejected the write.
    #[error("storage conflict: {0}")]
    Conflict(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Durable keyed storage for customers. Implementations assign ids on insert and
/// keep them unique.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    async fn get_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Exact match. If several customers share a name the earliest inserted wins.
    async fn get_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;

    async fn exists_by_id(&self, id: &CustomerId) -> Result<bool, StoreError>;

    /// Overwrites every mutable field. Returns `None` when no customer has `id`.
    async fn replace(
        &self,
        id: &CustomerId,
        customer: NewCustomer,
    ) -> Result<Option<Customer>, StoreError>;

    async fn delete_by_id(&self, id: &CustomerId) -> Result<(), StoreError>;
}
