//! Readiness endpoint. The service is ready when the database answers and every
//! embedded migration has been applied to it.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use clientele_db::{migrations, DbPool};
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub status: Readiness,
    pub detail: String,
}

impl ComponentStatus {
    fn ready(detail: impl Into<String>) -> Self {
        Self { status: Readiness::Ready, detail: detail.into() }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self { status: Readiness::Degraded, detail: detail.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub status: Readiness,
    pub database: ComponentStatus,
    pub schema: ComponentStatus,
    pub pending_migrations: Vec<i64>,
    pub checked_at: DateTime<Utc>,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(readiness)).with_state(db_pool)
}

pub async fn readiness(State(pool): State<DbPool>) -> (StatusCode, Json<ReadinessReport>) {
    let report = inspect(&pool).await;

    if report.status == Readiness::Ready {
        return (StatusCode::OK, Json(report));
    }

    warn!(
        event_name = "system.health.degraded",
        correlation_id = "health",
        customer_id = "unknown",
        database = %report.database.detail,
        schema = %report.schema.detail,
        "readiness check failed"
    );
    (StatusCode::SERVICE_UNAVAILABLE, Json(report))
}

async fn inspect(pool: &DbPool) -> ReadinessReport {
    let checked_at = Utc::now();

    if let Err(error) = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        return ReadinessReport {
            status: Readiness::Degraded,
            database: ComponentStatus::degraded(format!("database query failed: {error}")),
            schema: ComponentStatus::degraded("not inspected while the database is unreachable"),
            pending_migrations: Vec::new(),
            checked_at,
        };
    }

    let (schema, pending_migrations) = match migrations::pending_versions(pool).await {
        Ok(pending) if pending.is_empty() => {
            (ComponentStatus::ready("customer schema is current"), pending)
        }
        Ok(pending) => {
            let versions = pending.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
            (ComponentStatus::degraded(format!("pending migrations: {versions}")), pending)
        }
        Err(error) => (
            ComponentStatus::degraded(format!("migration state unreadable: {error}")),
            Vec::new(),
        ),
    };

    ReadinessReport {
        status: schema.status,
        database: ComponentStatus::ready("database query succeeded"),
        schema,
        pending_migrations,
        checked_at,
    }
}
