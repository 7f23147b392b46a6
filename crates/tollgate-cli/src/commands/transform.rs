//! Transform command - log a derivation between datasets.

use colored::Colorize;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::Context;

pub fn run(
    ctx: &Context,
    source: String,
    target: String,
    transformation_type: String,
    details: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let details = parse_details(&details)?;
    let gate = ctx.gate()?;
    let entry = gate.log_transformation(&source, &target, &transformation_type, details)?;

    println!(
        "{} {} {} {} ({})",
        "Logged".green().bold(),
        entry.source_dataset.white(),
        "->".cyan(),
        entry.target_dataset.white(),
        entry.transformation_type
    );
    Ok(())
}

/// Parse `key=value` pairs. Values that are valid JSON are kept as JSON,
/// anything else becomes a string.
fn parse_details(raw: &[String]) -> Result<IndexMap<String, JsonValue>, String> {
    raw.iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Invalid detail '{}': expected KEY=VALUE", pair))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("Invalid detail '{}': empty key", pair));
            }
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| JsonValue::String(value.to_string()));
            Ok((key.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_details() {
        let parsed = parse_details(&[
            "on=order_id".to_string(),
            "rows=42".to_string(),
            "keys=[\"a\",\"b\"]".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed["on"], json!("order_id"));
        assert_eq!(parsed["rows"], json!(42));
        assert_eq!(parsed["keys"], json!(["a", "b"]));
    }

    #[test]
    fn test_parse_details_rejects_missing_equals() {
        assert!(parse_details(&["oops".to_string()]).is_err());
        assert!(parse_details(&["=1".to_string()]).is_err());
    }
}
