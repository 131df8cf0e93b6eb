//! Prompt sent to the extraction service.

const TEMPLATE: &str = r#"Extract expenses from: "{TEXT}"
Return ONLY a JSON list with: "Item", "Category", "Amount".
Amount must be a plain number without currency symbols.
Example: [{ "Item": "Ravi Plumbing", "Category": "Others", "Amount": 5000 }]"#;

/// Embed the user's description into the extraction instruction.
pub fn build_prompt(text: &str) -> String {
    // Keep the quoted region intact if the user typed quotes themselves
    let text = text.trim().replace('"', "'");
    TEMPLATE.replace("{TEXT}", &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_keys() {
        let p = build_prompt("  5000 to Ravi for plumbing \n");
        assert!(p.starts_with(r#"Extract expenses from: "5000 to Ravi for plumbing""#));
        assert!(p.contains(r#""Item", "Category", "Amount""#));
        assert!(p.contains("Ravi Plumbing"));
    }

    #[test]
    fn test_prompt_neutralises_quotes() {
        let p = build_prompt(r#"paid "Sharma Stores" 300"#);
        assert!(p.contains("paid 'Sharma Stores' 300"));
    }
}
