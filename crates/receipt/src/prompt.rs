use tally_core::currency::SUPPORTED_CURRENCIES;

const TEXT_START: &str = "--- RECEIPT TEXT START ---";
const TEXT_END: &str = "--- RECEIPT TEXT END ---";

/// Instruction text shared by the vision and text paths.
///
/// With `receipt_text` the extracted document text is embedded verbatim;
/// without it the model is told to read the attached image.
pub fn build_prompt(categories: &[String], receipt_text: Option<&str>) -> String {
    let category_list = if categories.is_empty() {
        "(the user has no categories yet)".to_string()
    } else {
        categories
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let currencies = SUPPORTED_CURRENCIES.join(", ");

    let source = match receipt_text {
        Some(_) => "the receipt text below",
        None => "the attached receipt image",
    };

    let mut prompt = format!(
        "You extract expense data from receipts. Read {source} and reply with a single JSON object.\n\
         \n\
         Required keys:\n\
         - \"title\": string, a short name for the expense\n\
         - \"amount\": number, the total paid, without currency symbols\n\
         - \"currency\": string, one of {currencies}; use \"USD\" if unsure\n\
         \n\
         Optional keys:\n\
         - \"date\": string in YYYY-MM-DD format\n\
         - \"category\": string, exactly one of the user's categories listed below\n\
         - \"suggestedCategory\": string, a new category name if none of the user's categories fit\n\
         - \"vendor\": string, the merchant name\n\
         - \"description\": string, a one-sentence summary of what was bought\n\
         \n\
         User's categories:\n\
         {category_list}\n\
         \n\
         Respond with the JSON object only. Do not add explanations, markdown or any text outside the object."
    );

    if let Some(text) = receipt_text {
        prompt.push_str("\n\n");
        prompt.push_str(TEXT_START);
        prompt.push('\n');
        prompt.push_str(text);
        prompt.push('\n');
        prompt.push_str(TEXT_END);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_categories_and_currencies() {
        let prompt = build_prompt(&["Food".into(), "Travel".into()], None);
        assert!(prompt.contains("- Food\n- Travel"));
        assert!(prompt.contains("USD, EUR, GBP"));
        assert!(prompt.contains("attached receipt image"));
        assert!(!prompt.contains(TEXT_START));
    }

    #[test]
    fn embeds_text_verbatim() {
        let text = "ACME STORE\n  Total: $12.50 {not json}";
        let prompt = build_prompt(&[], Some(text));
        assert!(prompt.contains(&format!("{TEXT_START}\n{text}\n{TEXT_END}")));
        assert!(prompt.contains("no categories yet"));
    }

    #[test]
    fn names_every_key() {
        let prompt = build_prompt(&[], None);
        for key in [
            "title",
            "amount",
            "currency",
            "date",
            "category",
            "suggestedCategory",
            "vendor",
            "description",
        ] {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing {key}");
        }
    }
}
