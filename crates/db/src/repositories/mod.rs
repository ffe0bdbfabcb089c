use thiserror::Error;

use clientele_core::store::StoreError;

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(sqlx::Error::Database(database))
                if database.is_unique_violation() =>
            {
                StoreError::Conflict(format!("unique constraint violated: {}", database.message()))
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}
