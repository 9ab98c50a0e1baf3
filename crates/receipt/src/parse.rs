use thiserror::Error;

use crate::types::RawReceipt;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Could not parse AI response: the reply was empty")]
    EmptyResponse,
    #[error("Could not parse AI response: no JSON object found")]
    NoJson,
    #[error("Could not parse AI response: {0}")]
    Malformed(String),
}

/// The first balanced `{...}` span in `text`.
///
/// Braces inside JSON strings (including escaped quotes) do not count.
/// Returns `None` when there is no `{` or it is never closed.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a raw model reply into the untrusted receipt shape.
pub fn parse_reply(reply: &str) -> Result<RawReceipt, ParseError> {
    if reply.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }
    let span = extract_json_span(reply).ok_or(ParseError::NoJson)?;
    serde_json::from_str(span).map_err(|e| ParseError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn span_from_prose_wrapped_reply() {
        let reply = "Here is the result:\n{\"title\": \"Lunch\", \"amount\": 12.5}\nThanks";
        assert_eq!(
            extract_json_span(reply),
            Some("{\"title\": \"Lunch\", \"amount\": 12.5}")
        );
    }

    #[test]
    fn span_handles_nesting_and_braces_in_strings() {
        let reply = r#"```json
{"title": "Cafe {Central}", "meta": {"note": "quote \" and } brace"}, "amount": 3}
```"#;
        let span = extract_json_span(reply).unwrap();
        assert!(span.starts_with("{\"title\""));
        assert!(span.ends_with("\"amount\": 3}"));
        let v: Value = serde_json::from_str(span).unwrap();
        assert_eq!(v["title"], "Cafe {Central}");
    }

    #[test]
    fn span_missing_or_unclosed() {
        assert_eq!(extract_json_span("no json here"), None);
        assert_eq!(extract_json_span("{\"title\": \"open"), None);
    }

    #[test]
    fn parse_extracts_only_inner_object() {
        let raw = parse_reply("Sure! {\"title\":\"Taxi\",\"amount\":\"18.40\",\"currency\":\"eur\"} Let me know.")
            .unwrap();
        assert_eq!(raw.title.as_deref(), Some("Taxi"));
        assert_eq!(raw.amount, Some(Value::String("18.40".into())));
        assert_eq!(raw.currency.as_deref(), Some("eur"));
    }

    #[test]
    fn parse_empty_reply() {
        assert_eq!(parse_reply(""), Err(ParseError::EmptyResponse));
        assert_eq!(parse_reply("  \n\t "), Err(ParseError::EmptyResponse));
    }

    #[test]
    fn parse_without_object() {
        assert_eq!(parse_reply("I could not read this receipt."), Err(ParseError::NoJson));
    }

    #[test]
    fn parse_malformed_object() {
        assert!(matches!(
            parse_reply("{title: Lunch, amount: 12}"),
            Err(ParseError::Malformed(_))
        ));
    }
}
