use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

const ALLOWED_CURRENCIES: &[&str] = &["GBP", "USD", "EUR"];

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub card_number: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub currency: String,
    pub amount: i64,
    pub cvv: String,
}

// Card number and CVV must never reach logs, so Debug shows the redacted
// forms only.
impl fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("card_number", &format_args!("****{}", last_four(&self.card_number)))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("currency", &self.currency)
            .field("amount", &self.amount)
            .field("cvv", &"***")
            .finish()
    }
}

/// Last four characters of the card number, the only fragment ever retained.
pub fn last_four(card_number: &str) -> &str {
    match card_number.char_indices().rev().nth(3) {
        Some((idx, _)) => &card_number[idx..],
        None => card_number,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Check every rule in one pass so the caller sees all violations at once.
/// Pure; the current date is injected to keep the expiry check deterministic.
pub fn validate(req: &PaymentRequest, today: NaiveDate) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    if !(all_digits(&req.card_number) && (14..=19).contains(&req.card_number.len())) {
        violations.push(Violation::new(
            "cardNumber",
            "must be between 14 and 19 characters long and only contain numeric characters",
        ));
    }

    let month_ok = (1..=12).contains(&req.expiry_month);
    if !month_ok {
        violations.push(Violation::new("expiryMonth", "must be between 1 and 12"));
    }

    let year_ok = (2000..=9999).contains(&req.expiry_year);
    if !year_ok {
        violations.push(Violation::new("expiryYear", "must be between 2000 and 9999"));
    }

    let currency_known = ALLOWED_CURRENCIES
        .iter()
        .any(|code| code.eq_ignore_ascii_case(&req.currency));
    if req.currency.len() != 3 || !currency_known {
        violations.push(Violation::new("currency", "must be an allowed ISO currency code (GBP, USD, EUR)"));
    }

    if req.amount < 1 {
        violations.push(Violation::new("amount", "must be a positive amount in minor currency units"));
    }

    if !(all_digits(&req.cvv) && (3..=4).contains(&req.cvv.len())) {
        violations.push(Violation::new(
            "cvv",
            "must be 3-4 characters long and only contain numeric characters",
        ));
    }

    // Only meaningful once month and year are individually well-formed.
    if month_ok && year_ok {
        let before_current_month = req.expiry_year < today.year()
            || (req.expiry_year == today.year() && req.expiry_month < today.month() as i32);
        if before_current_month {
            violations.push(Violation::new(
                "expiryMonth",
                "the combination of expiry month and year must not be in the past",
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
