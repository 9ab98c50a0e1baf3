use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Normalized receipt data handed to the client to prefill an expense form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub title: String,
    /// Never negative. Zero means the amount could not be read.
    pub amount: f64,
    /// Always a supported code.
    pub currency: String,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

/// The model's reply as parsed, before any checks. Every field may be
/// missing or of the wrong JSON type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReceipt {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, alias = "suggested_category", deserialize_with = "lenient_string")]
    pub suggested_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// Strings pass through; numbers and booleans are stringified; anything
/// else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Where a receipt is in the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Uploaded,
    TextExtracted,
    PromptBuilt,
    ModelInvoked,
    ResponseParsed,
    Formatted,
    Done,
    Failed,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStage::Uploaded => write!(f, "uploaded"),
            ScanStage::TextExtracted => write!(f, "text_extracted"),
            ScanStage::PromptBuilt => write!(f, "prompt_built"),
            ScanStage::ModelInvoked => write!(f, "model_invoked"),
            ScanStage::ResponseParsed => write!(f, "response_parsed"),
            ScanStage::Formatted => write!(f, "formatted"),
            ScanStage::Done => write!(f, "done"),
            ScanStage::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_receipt_tolerates_wrong_types() {
        let raw: RawReceipt = serde_json::from_str(
            r#"{"title": 42, "amount": "12.50", "currency": null, "vendor": ["x"], "suggested_category": "Coffee"}"#,
        )
        .unwrap();
        assert_eq!(raw.title.as_deref(), Some("42"));
        assert_eq!(raw.amount, Some(Value::String("12.50".into())));
        assert_eq!(raw.currency, None);
        assert_eq!(raw.vendor, None);
        assert_eq!(raw.suggested_category.as_deref(), Some("Coffee"));
    }

    #[test]
    fn raw_receipt_accepts_empty_object() {
        let raw: RawReceipt = serde_json::from_str("{}").unwrap();
        assert_eq!(raw, RawReceipt::default());
    }

    #[test]
    fn record_serializes_camel_case_and_skips_absent() {
        let record = ReceiptRecord {
            title: "Coffee".into(),
            amount: 4.5,
            currency: "USD".into(),
            date: None,
            category: None,
            suggested_category: Some("Cafes".into()),
            vendor: None,
            description: None,
            receipt_url: Some("/uploads/a.png".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["suggestedCategory"], "Cafes");
        assert_eq!(json["receiptUrl"], "/uploads/a.png");
        assert!(json.get("date").is_none());
    }

    #[test]
    fn stage_display() {
        assert_eq!(ScanStage::ModelInvoked.to_string(), "model_invoked");
    }
}
