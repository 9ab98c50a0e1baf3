//! Turning an untrusted [`RawReceipt`] into a [`ReceiptRecord`].
//!
//! Both steps are pure and total: any input produces a record.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tally_core::currency::{self, BASE_CURRENCY};

use crate::types::{RawReceipt, ReceiptRecord};

pub const REPAIRED_TITLE: &str = "Expense";
pub const UNKNOWN_TITLE: &str = "Unknown Expense";

/// Fill the fields the model most often leaves out.
///
/// A missing title becomes the vendor or `"Expense"`, a missing currency
/// becomes USD. A missing amount is only logged; formatting turns it into 0.
pub fn repair(mut raw: RawReceipt) -> RawReceipt {
    if blank(&raw.title) {
        raw.title = Some(
            clean(raw.vendor.clone()).unwrap_or_else(|| REPAIRED_TITLE.to_string()),
        );
    }
    if blank(&raw.currency) {
        raw.currency = Some(BASE_CURRENCY.to_string());
    }
    if raw.amount.is_none() || raw.amount == Some(Value::Null) {
        tracing::warn!("AI response has no amount");
    }
    raw
}

/// Coerce every field to its final type and apply defaults.
pub fn format_receipt(raw: RawReceipt, receipt_url: Option<String>) -> ReceiptRecord {
    let vendor = clean(raw.vendor);
    let title = clean(raw.title)
        .or_else(|| vendor.clone())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let currency = raw
        .currency
        .as_deref()
        .and_then(currency::normalize_code)
        .unwrap_or(BASE_CURRENCY)
        .to_string();

    ReceiptRecord {
        title,
        amount: coerce_amount(raw.amount.as_ref()),
        currency,
        date: raw.date.as_deref().and_then(normalize_date),
        category: clean(raw.category),
        suggested_category: clean(raw.suggested_category),
        vendor,
        description: clean(raw.description),
        receipt_url: clean(receipt_url),
    }
}

/// Numbers pass through; strings yield their first amount with currency
/// symbols and thousands separators dropped. Result is finite and non-negative.
pub fn coerce_amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_amount_str(s),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v.abs(),
        _ => 0.0,
    }
}

fn re_number() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\d(?:[\d.,]*\d)?").expect("invalid regex"))
}

/// First number in the string that is not a percentage, so
/// `"19% VAT: 12.00"` reads as `12.00`.
fn parse_amount_str(s: &str) -> Option<f64> {
    let token = re_number()
        .find_iter(s)
        .find(|m| !s[m.end()..].trim_start().starts_with('%'))?
        .as_str();
    normalize_separators(token).parse::<f64>().ok()
}

/// When both marks appear the later one is the decimal point ("1.234,56").
/// A lone comma is decimal only with at most two digits after it.
fn normalize_separators(token: &str) -> String {
    match (token.rfind('.'), token.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => token.replace('.', "").replacen(',', ".", 1),
        (Some(_), Some(_)) => token.replace(',', ""),
        (None, Some(comma)) if token.matches(',').count() == 1 && token.len() - comma - 1 <= 2 => {
            token.replacen(',', ".", 1)
        }
        (None, Some(_)) => token.replace(',', ""),
        (Some(_), None) if token.matches('.').count() > 1 => token.replace('.', ""),
        _ => token.to_string(),
    }
}

fn normalize_date(s: &str) -> Option<String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}
