use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tier::{classify, Tier};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Unvalidated fields supplied by a caller for create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<Utc>>,
}

/// Validated customer fields without an identity; what a store persists.
///
/// Only [`CustomerInput::validate`] produces one outside of tests, so holding a
/// `NewCustomer` means name and email already passed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn from_new(id: CustomerId, customer: NewCustomer) -> Self {
        Self {
            id,
            name: customer.name,
            email: customer.email,
            annual_spend: customer.annual_spend,
            last_purchase_date: customer.last_purchase_date,
        }
    }
}

/// A customer as seen by callers. The tier is derived on construction and never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<Utc>>,
    pub tier: Tier,
}

impl CustomerView {
    pub fn at(customer: Customer, now: DateTime<Utc>) -> Self {
        let tier = classify(customer.annual_spend, customer.last_purchase_date, now);
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            annual_spend: customer.annual_spend,
            last_purchase_date: customer.last_purchase_date,
            tier,
        }
    }
}

/// Parses an ISO-8601 timestamp. Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
