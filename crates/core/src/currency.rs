//! Fixed exchange-rate table and conversion through the USD pivot.
//!
//! Rates are "units of the currency per 1 USD". Updating them is a code
//! change; nothing mutates the table at runtime.

use serde::Serialize;

pub const BASE_CURRENCY: &str = "USD";

/// (code, units per 1 USD, display symbol)
const RATES: &[(&str, f64, &str)] = &[
    ("USD", 1.0, "$"),
    ("EUR", 0.92, "€"),
    ("GBP", 0.79, "£"),
    ("JPY", 149.50, "¥"),
    ("CAD", 1.36, "CA$"),
    ("AUD", 1.53, "A$"),
    ("CHF", 0.88, "CHF"),
    ("CNY", 7.24, "CN¥"),
    ("INR", 83.12, "₹"),
    ("MXN", 17.15, "MX$"),
    ("BRL", 4.97, "R$"),
];

/// Every supported code, in table order.
pub const SUPPORTED_CURRENCIES: [&str; 11] = [
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "INR", "MXN", "BRL",
];

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub rate: f64,
    pub symbol: &'static str,
}

fn lookup(code: &str) -> Option<&'static (&'static str, f64, &'static str)> {
    let code = code.trim();
    RATES.iter().find(|(c, _, _)| c.eq_ignore_ascii_case(code))
}

/// Canonical upper-case code, or `None` when the code is not in the table.
pub fn normalize_code(code: &str) -> Option<&'static str> {
    lookup(code).map(|(c, _, _)| *c)
}

pub fn is_supported(code: &str) -> bool {
    lookup(code).is_some()
}

pub fn rate(code: &str) -> Option<f64> {
    lookup(code).map(|(_, r, _)| *r)
}

pub fn symbol(code: &str) -> Option<&'static str> {
    lookup(code).map(|(_, _, s)| *s)
}

pub fn all() -> Vec<CurrencyInfo> {
    RATES
        .iter()
        .map(|&(code, rate, symbol)| CurrencyInfo { code, rate, symbol })
        .collect()
}

pub(crate) fn same_currency(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Rate for one side of a conversion. Unknown codes fall back to USD.
fn rate_or_base(code: &str, side: &str) -> f64 {
    match rate(code) {
        Some(r) => r,
        None => {
            tracing::warn!(
                code = code,
                side = side,
                "Unsupported currency code, treating as {BASE_CURRENCY}"
            );
            1.0
        }
    }
}

/// Convert `amount` from one currency to another.
///
/// Equal codes (case-insensitive) return the input untouched. An unknown code
/// on either side is treated as USD, so this never fails.
pub fn convert(amount: f64, from: &str, to: &str) -> f64 {
    if same_currency(from, to) {
        return amount;
    }
    let from_rate = rate_or_base(from, "from");
    let to_rate = rate_or_base(to, "to");
    amount / from_rate * to_rate
}

/// Human-readable amount: symbol prefix, no decimals for JPY.
pub fn format_amount(amount: f64, code: &str) -> String {
    let code = normalize_code(code).unwrap_or(BASE_CURRENCY);
    let symbol = symbol(code).unwrap_or("$");
    match code {
        "JPY" => format!("{symbol}{amount:.0}"),
        _ => format!("{symbol}{amount:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        if b == 0.0 {
            return a.abs() < 1e-12;
        }
        ((a - b) / b).abs() <= 1e-9
    }

    #[test]
    fn table_and_supported_list_agree() {
        assert_eq!(RATES.len(), SUPPORTED_CURRENCIES.len());
        for code in SUPPORTED_CURRENCIES {
            let r = rate(code).unwrap();
            assert!(r > 0.0, "{code} rate must be positive");
        }
        assert_eq!(rate("USD"), Some(1.0));
    }

    #[test]
    fn round_trip_all_pairs() {
        for a in SUPPORTED_CURRENCIES {
            for b in SUPPORTED_CURRENCIES {
                for x in [0.0, 1.0, 100.5, 1_000_000.0] {
                    let back = convert(convert(x, a, b), b, a);
                    assert!(close(back, x), "{a}->{b}->{a}: {x} became {back}");
                }
            }
        }
    }

    #[test]
    fn same_currency_is_exact() {
        for code in SUPPORTED_CURRENCIES {
            let x = 0.1 + 0.2;
            assert_eq!(convert(x, code, code).to_bits(), x.to_bits());
        }
        assert_eq!(convert(42.42, "gbp", "GBP"), 42.42);
    }

    #[test]
    fn usd_to_eur_is_rate() {
        assert_eq!(convert(100.0, "USD", "EUR"), 100.0 * rate("EUR").unwrap());
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(convert(10.0, "usd", "jpy"), convert(10.0, "USD", "JPY"));
        assert_eq!(normalize_code(" eur "), Some("EUR"));
    }

    #[test]
    fn unsupported_code_falls_back_to_usd() {
        let from_unknown = convert(50.0, "XYZ", "EUR");
        assert!(from_unknown.is_finite());
        assert_eq!(from_unknown, convert(50.0, "USD", "EUR"));

        let to_unknown = convert(50.0, "GBP", "???");
        assert!(to_unknown.is_finite());
        assert_eq!(to_unknown, convert(50.0, "GBP", "USD"));
    }

    #[test]
    fn format_amount_per_currency() {
        assert_eq!(format_amount(12.5, "USD"), "$12.50");
        assert_eq!(format_amount(1500.4, "jpy"), "¥1500");
        assert_eq!(format_amount(3.0, "nope"), "$3.00");
    }
}
