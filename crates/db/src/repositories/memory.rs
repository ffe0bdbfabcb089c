use tokio::sync::RwLock;

use clientele_core::domain::customer::{Customer, CustomerId, NewCustomer};
use clientele_core::store::{CustomerStore, StoreError};

/// Process-local store with the same contract as the SQL store. Customers are kept in
/// insertion order so duplicate-name lookups resolve to the earliest insert.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<Vec<Customer>>,
}

fn email_conflict(email: &str) -> StoreError {
    StoreError::Conflict(format!("a customer with email `{email}` already exists"))
}

#[async_trait::async_trait]
impl CustomerStore for InMemoryCustomerRepository {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let mut customers = self.customers.write().await;
        if customers.iter().any(|existing| existing.email == customer.email) {
            return Err(email_conflict(&customer.email));
        }

        let saved = Customer::from_new(CustomerId::generate(), customer);
        customers.push(saved.clone());
        Ok(saved)
    }

    async fn get_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, StoreError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| &customer.id == id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| customer.name == name).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| customer.email == email).cloned())
    }

    async fn exists_by_id(&self, id: &CustomerId) -> Result<bool, StoreError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().any(|customer| &customer.id == id))
    }

    async fn replace(
        &self,
        id: &CustomerId,
        customer: NewCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        let mut customers = self.customers.write().await;
        let Some(position) = customers.iter().position(|existing| &existing.id == id) else {
            return Ok(None);
        };
        if customers.iter().any(|other| &other.id != id && other.email == customer.email) {
            return Err(email_conflict(&customer.email));
        }

        let replaced = Customer::from_new(*id, customer);
        customers[position] = replaced.clone();
        Ok(Some(replaced))
    }

    async fn delete_by_id(&self, id: &CustomerId) -> Result<(), StoreError> {
        let mut customers = self.customers.write().await;
        customers.retain(|customer| &customer.id != id);
        Ok(())
    }
}
