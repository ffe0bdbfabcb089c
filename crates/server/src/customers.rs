//! HTTP surface for the customer registry.
//!
//! Routes live under `/api/v1/customers`. Bodies use camelCase field names, every
//! request gets a fresh correlation id, and failures are rendered as
//! `{"error": ..., "correlation_id": ...}` with the status derived from
//! [`InterfaceError`].

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use clientele_core::{
    parse_timestamp, CustomerId, CustomerInput, CustomerRegistry, CustomerView, InterfaceError,
    Tier,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct CustomerState {
    registry: CustomerRegistry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub annual_spend: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub last_purchase_date: Option<DateTime<Utc>>,
}

impl From<CustomerRequest> for CustomerInput {
    fn from(request: CustomerRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            annual_spend: request.annual_spend,
            last_purchase_date: request.last_purchase_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<Utc>>,
    pub tier: Tier,
}

impl From<CustomerView> for CustomerResponse {
    fn from(view: CustomerView) -> Self {
        Self {
            id: view.id.to_string(),
            name: view.name,
            email: view.email,
            annual_spend: view.annual_spend,
            last_purchase_date: view.last_purchase_date,
            tier: view.tier,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerLookup {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(registry: CustomerRegistry) -> Router {
    Router::new()
        .route("/api/v1/customers", post(create_customer).get(lookup_customer))
        .route(
            "/api/v1/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .with_state(CustomerState { registry })
}

async fn create_customer(
    State(state): State<CustomerState>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let correlation_id = new_correlation_id();
    let Json(request) = payload.map_err(|rejection| bad_body(rejection, &correlation_id))?;

    let created = state
        .registry
        .create(request.into())
        .await
        .map_err(|error| render(error.into_interface(correlation_id.as_str())))?;

    info!(
        event_name = "customer.created",
        correlation_id = %correlation_id,
        customer_id = %created.id,
        tier = %created.tier,
        "customer created"
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn get_customer(
    State(state): State<CustomerState>,
    Path(raw_id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let id = parse_id(&raw_id, &correlation_id)?;

    let found = state
        .registry
        .find_by_id(&id)
        .await
        .map_err(|error| render(error.into_interface(correlation_id.as_str())))?;

    found
        .map(|view| Json(view.into()))
        .ok_or_else(|| missing(&correlation_id, &raw_id))
}

async fn lookup_customer(
    State(state): State<CustomerState>,
    query: Result<Query<CustomerLookup>, QueryRejection>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let Query(lookup) = query.map_err(|rejection| {
        render(InterfaceError::bad_request(rejection.body_text(), correlation_id.as_str()))
    })?;

    let found = match (lookup.name, lookup.email) {
        (Some(name), None) => state.registry.find_by_name(&name).await,
        (None, Some(email)) => state.registry.find_by_email(&email).await,
        _ => {
            return Err(render(InterfaceError::bad_request(
                "exactly one of `name` or `email` query parameters is required",
                correlation_id,
            )));
        }
    }
    .map_err(|error| render(error.into_interface(correlation_id.as_str())))?;

    found.map(|view| Json(view.into())).ok_or_else(|| {
        render(InterfaceError::not_found("no customer matches the lookup", correlation_id))
    })
}

async fn update_customer(
    State(state): State<CustomerState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let id = parse_id(&raw_id, &correlation_id)?;
    let Json(request) = payload.map_err(|rejection| bad_body(rejection, &correlation_id))?;

    let updated = state
        .registry
        .update(&id, request.into())
        .await
        .map_err(|error| render(error.into_interface(correlation_id.as_str())))?;

    match updated {
        Some(view) => {
            info!(
                event_name = "customer.updated",
                correlation_id = %correlation_id,
                customer_id = %view.id,
                tier = %view.tier,
                "customer updated"
            );
            Ok(Json(view.into()))
        }
        None => Err(missing(&correlation_id, &raw_id)),
    }
}

async fn delete_customer(
    State(state): State<CustomerState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = new_correlation_id();
    let id = parse_id(&raw_id, &correlation_id)?;

    let removed = state
        .registry
        .delete(&id)
        .await
        .map_err(|error| render(error.into_interface(correlation_id.as_str())))?;

    if !removed {
        return Err(missing(&correlation_id, &raw_id));
    }

    info!(
        event_name = "customer.deleted",
        correlation_id = %correlation_id,
        customer_id = %id,
        "customer deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

// Ids are opaque to callers: text that is not a UUID cannot name a stored customer,
// so it answers 404 like any other unknown id instead of 400.
fn parse_id(raw_id: &str, correlation_id: &str) -> Result<CustomerId, ApiError> {
    raw_id.parse::<CustomerId>().map_err(|_| missing(correlation_id, raw_id))
}

fn missing(correlation_id: &str, raw_id: &str) -> ApiError {
    render(InterfaceError::not_found(format!("customer `{raw_id}` was not found"), correlation_id))
}

fn bad_body(rejection: JsonRejection, correlation_id: &str) -> ApiError {
    render(InterfaceError::bad_request(rejection.body_text(), correlation_id))
}

fn render(error: InterfaceError) -> ApiError {
    let (status, message) = match &error {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::Conflict { .. } => (StatusCode::CONFLICT, error.user_message().to_string()),
        InterfaceError::ServiceUnavailable { message, .. } => {
            error!(
                event_name = "customer.store.unavailable",
                correlation_id = %error.correlation_id(),
                detail = %message,
                "customer store call failed"
            );
            (StatusCode::SERVICE_UNAVAILABLE, error.user_message().to_string())
        }
    };

    if status.is_client_error() {
        warn!(
            event_name = "customer.request.rejected",
            correlation_id = %error.correlation_id(),
            status = status.as_u16(),
            detail = %message,
            "customer request rejected"
        );
    }

    (status, Json(ErrorBody { error: message, correlation_id: error.correlation_id().to_string() }))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| {
        parse_timestamp(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("`{value}` is not an ISO-8601 timestamp"))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use chrono::{Months, Utc};
    use clientele_core::{CustomerRegistry, Tier};
    use clientele_db::InMemoryCustomerRepository;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, CustomerResponse, ErrorBody};

    fn app() -> Router {
        router(CustomerRegistry::new(Arc::new(InMemoryCustomerRepository::default())))
    }

    fn months_ago(months: u32) -> String {
        Utc::now()
            .checked_sub_months(Months::new(months))
            .expect("representable date")
            .to_rfc3339()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        (status, bytes.to_vec())
    }

    async fn create(app: &Router, body: Value) -> CustomerResponse {
        let (status, bytes) = send(app, Method::POST, "/api/v1/customers", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&bytes));
        serde_json::from_slice(&bytes).expect("customer response")
    }

    #[tokio::test]
    async fn create_returns_created_customer_with_derived_tier() {
        let app = app();
        let created = create(
            &app,
            json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "annualSpend": 1500,
                "lastPurchaseDate": months_ago(3),
            }),
        )
        .await;

        assert_eq!(created.tier, Tier::Gold);
        assert_eq!(created.annual_spend, Some(Decimal::new(1500, 0)));
        assert!(created.id.parse::<uuid::Uuid>().is_ok());

        let (status, bytes) =
            send(&app, Method::GET, &format!("/api/v1/customers/{}", created.id), None).await;
        assert_eq!(status, StatusCode::OK);
        let fetched: CustomerResponse = serde_json::from_slice(&bytes).expect("customer");
        assert_eq!(fetched.email, "jane@example.com");
        assert_eq!(fetched.tier, Tier::Gold);
    }

    #[tokio::test]
    async fn create_accepts_string_spend_and_naive_timestamp() {
        let app = app();
        let naive = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let created = create(
            &app,
            json!({
                "name": "Big Spender",
                "email": "big@example.com",
                "annualSpend": "11000.50",
                "lastPurchaseDate": naive,
            }),
        )
        .await;

        assert_eq!(created.tier, Tier::Platinum);
        assert_eq!(created.annual_spend, Some(Decimal::new(1_100_050, 2)));
    }

    #[tokio::test]
    async fn absent_optional_fields_serialize_as_null_and_classify_silver() {
        let app = app();
        let (status, bytes) = send(
            &app,
            Method::POST,
            "/api/v1/customers",
            Some(json!({ "name": "Quiet", "email": "quiet@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["annualSpend"], Value::Null);
        assert_eq!(body["lastPurchaseDate"], Value::Null);
        assert_eq!(body["tier"], "Silver");
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_with_correlated_bad_request() {
        let app = app();
        let (status, bytes) = send(
            &app,
            Method::POST,
            "/api/v1/customers",
            Some(json!({ "name": "  ", "email": "jane@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body");
        assert!(body.error.contains("name"), "unexpected message: {}", body.error);
        assert!(!body.correlation_id.is_empty());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "name": "Jane",
                "email": "jane@example.com",
                "lastPurchaseDate": "soon",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict() {
        let app = app();
        create(&app, json!({ "name": "Jane", "email": "jane@example.com" })).await;

        let (status, bytes) = send(
            &app,
            Method::POST,
            "/api/v1/customers",
            Some(json!({ "name": "Other Jane", "email": "jane@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body");
        assert!(!body.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn lookup_by_name_and_email_requires_exactly_one_parameter() {
        let app = app();
        let created =
            create(&app, json!({ "name": "Jane Doe", "email": "jane@example.com" })).await;

        let (status, bytes) =
            send(&app, Method::GET, "/api/v1/customers?name=Jane%20Doe", None).await;
        assert_eq!(status, StatusCode::OK);
        let by_name: CustomerResponse = serde_json::from_slice(&bytes).expect("customer");
        assert_eq!(by_name.id, created.id);

        let (status, bytes) =
            send(&app, Method::GET, "/api/v1/customers?email=jane@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        let by_email: CustomerResponse = serde_json::from_slice(&bytes).expect("customer");
        assert_eq!(by_email.id, created.id);

        let (status, _) =
            send(&app, Method::GET, "/api/v1/customers?email=nobody@example.com", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/v1/customers", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/v1/customers?name=Jane%20Doe&email=jane@example.com",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_recomputes_tier() {
        let app = app();
        let created = create(
            &app,
            json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "annualSpend": 12000,
                "lastPurchaseDate": months_ago(1),
            }),
        )
        .await;
        assert_eq!(created.tier, Tier::Platinum);

        let (status, bytes) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/customers/{}", created.id),
            Some(json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "annualSpend": 5000,
                "lastPurchaseDate": Utc::now().to_rfc3339(),
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let updated: CustomerResponse = serde_json::from_slice(&bytes).expect("customer");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.tier, Tier::Gold);
    }

    #[tokio::test]
    async fn update_of_unknown_customer_is_not_found_and_creates_nothing() {
        let app = app();
        let unknown = uuid::Uuid::new_v4();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/customers/{unknown}"),
            Some(json!({ "name": "Ghost", "email": "ghost@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, Method::GET, "/api/v1/customers?email=ghost@example.com", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_returns_no_content_once_then_not_found() {
        let app = app();
        let created = create(&app, json!({ "name": "Jane", "email": "jane@example.com" })).await;
        let uri = format!("/api/v1/customers/{}", created.id);

        let (status, bytes) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(bytes.is_empty());

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_uuid_path_is_treated_as_unknown_customer() {
        let app = app();

        let (status, bytes) = send(&app, Method::GET, "/api/v1/customers/customer-42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body");
        assert!(body.error.contains("customer-42"));

        let (status, _) = send(&app, Method::DELETE, "/api/v1/customers/customer-42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unparseable_query_string_is_rendered_as_error_envelope() {
        let app = app();

        let (status, bytes) =
            send(&app, Method::GET, "/api/v1/customers?name=a&name=b", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(&bytes).expect("error envelope");
        assert!(body.error.contains("name"), "unexpected message: {}", body.error);
        assert!(!body.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_body_is_bad_request() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/customers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .expect("request");

        let response = app.oneshot(request).await.expect("router should respond");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
