use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use uuid::Uuid;

use clientele_core::domain::customer::{Customer, CustomerId, NewCustomer};
use clientele_core::store::{CustomerStore, StoreError};

use super::RepositoryError;
use crate::DbPool;

const CUSTOMER_COLUMNS: &str = "id, name, email, annual_spend, last_purchase_date";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_first(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let statement = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE {predicate} = ? ORDER BY rowid ASC LIMIT 1"
        );
        let row = sqlx::query(&statement).bind(value).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }
}

fn decode_error(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let name: String = row.try_get("name").map_err(decode_error)?;
    let email: String = row.try_get("email").map_err(decode_error)?;
    let annual_spend_str: Option<String> = row.try_get("annual_spend").map_err(decode_error)?;
    let last_purchase_str: Option<String> =
        row.try_get("last_purchase_date").map_err(decode_error)?;

    let id = Uuid::parse_str(&id)
        .map_err(|error| RepositoryError::Decode(format!("customer id `{id}`: {error}")))?;
    let annual_spend = annual_spend_str
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|error| RepositoryError::Decode(format!("annual_spend `{raw}`: {error}")))
        })
        .transpose()?;
    let last_purchase_date = last_purchase_str
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&Utc)).map_err(|error| {
                RepositoryError::Decode(format!("last_purchase_date `{raw}`: {error}"))
            })
        })
        .transpose()?;

    Ok(Customer { id: CustomerId(id), name, email, annual_spend, last_purchase_date })
}

#[async_trait::async_trait]
impl CustomerStore for SqlCustomerRepository {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let id = CustomerId::generate();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO customer (id, name, email, annual_spend, last_purchase_date,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.annual_spend.map(|spend| spend.to_string()))
        .bind(customer.last_purchase_date.map(|dt| dt.to_rfc3339()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(Customer::from_new(id, customer))
    }

    async fn get_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.fetch_first("id", &id.to_string()).await?)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.fetch_first("name", name).await?)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.fetch_first("email", email).await?)
    }

    async fn exists_by_id(&self, id: &CustomerId) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(count > 0)
    }

    async fn replace(
        &self,
        id: &CustomerId,
        customer: NewCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        let result = sqlx::query(
            "UPDATE customer
             SET name = ?, email = ?, annual_spend = ?, last_purchase_date = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.annual_spend.map(|spend| spend.to_string()))
        .bind(customer.last_purchase_date.map(|dt| dt.to_rfc3339()))
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Customer::from_new(*id, customer)))
    }

    async fn delete_by_id(&self, id: &CustomerId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM customer WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use clientele_core::domain::customer::{CustomerId, NewCustomer};
    use clientele_core::store::{CustomerStore, StoreError};

    use super::SqlCustomerRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> (DbPool, SqlCustomerRepository) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        (pool.clone(), SqlCustomerRepository::new(pool))
    }

    fn new_customer(name: &str, email: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: email.to_string(),
            annual_spend: Some(Decimal::new(1_234_567, 2)),
            last_purchase_date: Some(
                Utc.with_ymd_and_hms(2026, 2, 14, 16, 45, 30).single().expect("valid date"),
            ),
        }
    }

    #[tokio::test]
    async fn insert_then_get_by_id_preserves_decimal_and_timestamp() {
        let (pool, repo) = setup().await;
        let saved = repo.insert(new_customer("Jane Doe", "jane@example.com")).await.expect("save");

        let found = repo.get_by_id(&saved.id).await.expect("find").expect("present");
        assert_eq!(found, saved);
        assert_eq!(found.annual_spend.map(|spend| spend.to_string()), Some("12345.67".to_string()));

        let stored: String =
            sqlx::query_scalar("SELECT last_purchase_date FROM customer WHERE id = ?")
                .bind(saved.id.to_string())
                .fetch_one(&pool)
                .await
                .expect("raw timestamp");
        assert_eq!(stored, "2026-02-14T16:45:30+00:00");
    }

    #[tokio::test]
    async fn optional_fields_persist_as_null() {
        let (pool, repo) = setup().await;
        let mut customer = new_customer("Sam", "sam@example.com");
        customer.annual_spend = None;
        customer.last_purchase_date = None;

        let saved = repo.insert(customer).await.expect("save");
        let found = repo.get_by_id(&saved.id).await.expect("find").expect("present");
        assert_eq!(found.annual_spend, None);
        assert_eq!(found.last_purchase_date, None);

        let nulls: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customer WHERE annual_spend IS NULL AND last_purchase_date IS NULL",
        )
        .fetch_one(&pool)
        .await
        .expect("count nulls");
        assert_eq!(nulls, 1);
    }

    #[tokio::test]
    async fn name_lookup_returns_earliest_insert_among_duplicates() {
        let (_, repo) = setup().await;
        let first = repo.insert(new_customer("Alex Kim", "alex.one@example.com")).await.expect("1");
        repo.insert(new_customer("Alex Kim", "alex.two@example.com")).await.expect("2");

        let found = repo.get_by_name("Alex Kim").await.expect("find").expect("present");
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_, repo) = setup().await;
        repo.insert(new_customer("Jane", "jane@example.com")).await.expect("first");

        let error = repo
            .insert(new_customer("Other Jane", "jane@example.com"))
            .await
            .expect_err("duplicate email should fail");
        assert!(matches!(error, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn replace_overwrites_fields_and_keeps_id() {
        let (_, repo) = setup().await;
        let saved = repo.insert(new_customer("Jane", "jane@example.com")).await.expect("save");

        let replacement = NewCustomer {
            name: "Jane Smith".to_string(),
            email: "jane.smith@example.com".to_string(),
            annual_spend: None,
            last_purchase_date: None,
        };
        let replaced =
            repo.replace(&saved.id, replacement).await.expect("replace").expect("present");
        assert_eq!(replaced.id, saved.id);

        let found = repo.get_by_id(&saved.id).await.expect("find").expect("present");
        assert_eq!(found, replaced);
        assert_eq!(repo.get_by_email("jane@example.com").await.expect("old email"), None);
    }

    #[tokio::test]
    async fn replace_of_unknown_id_changes_nothing() {
        let (pool, repo) = setup().await;
        let outcome = repo
            .replace(&CustomerId::generate(), new_customer("Ghost", "ghost@example.com"))
            .await
            .expect("replace");
        assert_eq!(outcome, None);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn exists_and_delete_track_presence() {
        let (_, repo) = setup().await;
        let saved = repo.insert(new_customer("Jane", "jane@example.com")).await.expect("save");

        assert!(repo.exists_by_id(&saved.id).await.expect("exists"));
        repo.delete_by_id(&saved.id).await.expect("delete");
        assert!(!repo.exists_by_id(&saved.id).await.expect("exists after delete"));
        repo.delete_by_id(&saved.id).await.expect("deleting twice is a no-op");
    }

    #[tokio::test]
    async fn undecodable_rows_surface_as_backend_errors() {
        let (pool, repo) = setup().await;
        let id = CustomerId::generate();
        sqlx::query(
            "INSERT INTO customer (id, name, email, annual_spend, created_at, updated_at)
             VALUES (?, 'Broken', 'broken@example.com', 'lots', '2026-01-01T00:00:00Z',
                     '2026-01-01T00:00:00Z')",
        )
        .bind(id.to_string())
        .execute(&pool)
        .await
        .expect("seed broken row");

        let error = repo.get_by_id(&id).await.expect_err("decode should fail");
        assert!(matches!(error, StoreError::Backend(ref message) if message.contains("annual_spend")));
    }
}
