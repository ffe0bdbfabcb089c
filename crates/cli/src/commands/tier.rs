use std::str::FromStr;

use chrono::{DateTime, Utc};
use clientele_core::{classify, parse_timestamp};
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::CommandResult;

const COMMAND: &str = "tier";

/// Evaluates the tier rules offline; nothing is read from or written to a store.
pub fn run(spend: &str, last_purchase: Option<&str>, now: Option<&str>) -> CommandResult {
    match evaluate(spend, last_purchase, now) {
        Ok(result) => result,
        Err(message) => CommandResult::failure(COMMAND, "invalid_input", message, 2),
    }
}

fn evaluate(
    spend: &str,
    last_purchase: Option<&str>,
    now: Option<&str>,
) -> Result<CommandResult, String> {
    let annual_spend = Decimal::from_str(spend.trim())
        .map_err(|error| format!("`{spend}` is not a decimal amount: {error}"))?;
    if annual_spend.is_sign_negative() && !annual_spend.is_zero() {
        return Err(format!("annual spend must not be negative, got `{spend}`"));
    }

    let last_purchase_date = last_purchase.map(|raw| timestamp("last-purchase", raw)).transpose()?;
    let evaluated_at = match now {
        Some(raw) => timestamp("now", raw)?,
        None => Utc::now(),
    };

    let tier = classify(Some(annual_spend), last_purchase_date, evaluated_at);
    Ok(CommandResult::success_with(
        COMMAND,
        tier.as_str(),
        json!({
            "tier": tier,
            "annual_spend": annual_spend,
            "last_purchase_date": last_purchase_date,
            "evaluated_at": evaluated_at,
        }),
    ))
}

fn timestamp(flag: &str, raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).ok_or_else(|| format!("--{flag} `{raw}` is not an ISO-8601 timestamp"))
}
