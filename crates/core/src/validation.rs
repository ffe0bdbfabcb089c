use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::customer::{CustomerInput, NewCustomer};
use crate::errors::DomainError;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

// Letters, marks and digits from any script are accepted alongside the ASCII set.
const LOCAL_ATOM: &str = r"[\p{L}\p{M}\p{N}!#$%&'*+/=?^_`{|}~-]+";
const DOMAIN_LABEL: &str = r"[\p{L}\p{M}\p{N}](?:[\p{L}\p{M}\p{N}-]*[\p{L}\p{M}\p{N}])?";

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(&format!(
            "^{LOCAL_ATOM}(?:\\.{LOCAL_ATOM})*@{DOMAIN_LABEL}(?:\\.{DOMAIN_LABEL})*$"
        ))
        .expect("email pattern is a valid regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

impl CustomerInput {
    /// Checks the caller-supplied fields and hands back the persistable form.
    /// Values are kept exactly as supplied; only blank-ness is judged after trimming.
    pub fn validate(self) -> Result<NewCustomer, DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be blank"));
        }

        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email", "must not be blank"));
        }
        if !is_valid_email(&self.email) {
            return Err(DomainError::validation(
                "email",
                format!("`{}` is not a well-formed email address", self.email),
            ));
        }

        if self.annual_spend.is_some_and(|spend| spend < Decimal::ZERO) {
            return Err(DomainError::validation("annual_spend", "must not be negative"));
        }

        Ok(NewCustomer {
            name: self.name,
            email: self.email,
            annual_spend: self.annual_spend,
            last_purchase_date: self.last_purchase_date,
        })
    }
}
