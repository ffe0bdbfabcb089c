//! Customer lifecycle orchestration.
//!
//! The registry validates caller input, delegates persistence to a [`CustomerStore`],
//! and turns stored customers into [`CustomerView`]s with a freshly derived tier.
//! It keeps no state of its own besides the store handle, so one instance can be
//! shared across concurrent requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::customer::{Customer, CustomerId, CustomerInput, CustomerView};
use crate::errors::ApplicationError;
use crate::store::CustomerStore;

pub type Clock = fn() -> DateTime<Utc>;

#[derive(Clone)]
pub struct CustomerRegistry {
    store: Arc<dyn CustomerStore>,
    clock: Clock,
}

impl CustomerRegistry {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self::with_clock(store, Utc::now)
    }

    pub fn with_clock(store: Arc<dyn CustomerStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, input: CustomerInput) -> Result<CustomerView, ApplicationError> {
        let customer = input.validate()?;
        let saved = self.store.insert(customer).await?;
        Ok(self.view(saved))
    }

    pub async fn find_by_id(
        &self,
        id: &CustomerId,
    ) -> Result<Option<CustomerView>, ApplicationError> {
        Ok(self.store.get_by_id(id).await?.map(|customer| self.view(customer)))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<CustomerView>, ApplicationError> {
        Ok(self.store.get_by_name(name).await?.map(|customer| self.view(customer)))
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerView>, ApplicationError> {
        Ok(self.store.get_by_email(email).await?.map(|customer| self.view(customer)))
    }

    /// Replaces every mutable field with the values in `input`; fields left out of
    /// `input` are cleared. Returns `None` without touching the store's contents when
    /// `id` is unknown.
    pub async fn update(
        &self,
        id: &CustomerId,
        input: CustomerInput,
    ) -> Result<Option<CustomerView>, ApplicationError> {
        let customer = input.validate()?;
        Ok(self.store.replace(id, customer).await?.map(|customer| self.view(customer)))
    }

    /// Returns whether a customer was removed. The existence check and the delete are
    /// two store calls, so two concurrent deletes of one id may both report `true`.
    pub async fn delete(&self, id: &CustomerId) -> Result<bool, ApplicationError> {
        if !self.store.exists_by_id(id).await? {
            return Ok(false);
        }
        self.store.delete_by_id(id).await?;
        Ok(true)
    }

    fn view(&self, customer: Customer) -> CustomerView {
        CustomerView::at(customer, (self.clock)())
    }
}
