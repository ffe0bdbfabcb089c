//! Loyalty tier classification.
//!
//! A tier is a pure function of annual spend, the most recent purchase, and the
//! current time. Rules are checked from most to least exclusive and the first match
//! wins; anything that matches no rule is [`Tier::Silver`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Platinum,
    Gold,
    Silver,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platinum => "Platinum",
            Self::Gold => "Gold",
            Self::Silver => "Silver",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown tier `{0}` (expected platinum|gold|silver)")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "platinum" => Ok(Self::Platinum),
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

struct TierRule {
    tier: Tier,
    min_spend: Decimal,
    window: Months,
}

impl TierRule {
    fn matches(
        &self,
        spend: Decimal,
        last_purchase: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        if spend < self.min_spend {
            return false;
        }
        // Calendar months with day clamping: Mar 31 minus 6 months is Sep 30.
        let window_start = now.checked_sub_months(self.window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        last_purchase.is_some_and(|purchased_at| purchased_at > window_start)
    }
}

const RULES: [TierRule; 2] = [
    TierRule {
        tier: Tier::Platinum,
        min_spend: Decimal::from_parts(10_000, 0, 0, false, 0),
        window: Months::new(6),
    },
    TierRule {
        tier: Tier::Gold,
        min_spend: Decimal::from_parts(1_000, 0, 0, false, 0),
        window: Months::new(12),
    },
];

/// Derives the tier for a customer. Absent spend counts as zero; an absent purchase
/// date never qualifies for anything above Silver.
pub fn classify(
    annual_spend: Option<Decimal>,
    last_purchase: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Tier {
    let spend = annual_spend.unwrap_or(Decimal::ZERO);
    RULES
        .iter()
        .find(|rule| rule.matches(spend, last_purchase, now))
        .map(|rule| rule.tier)
        .unwrap_or(Tier::Silver)
}
