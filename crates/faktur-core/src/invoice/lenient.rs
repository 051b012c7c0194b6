//! Permissive field deserializers for language-model output.
//!
//! The model is asked for a fixed schema but routinely returns numbers as
//! strings, strings as numbers, the literal text `"null"`, or a nested object
//! where a scalar was expected. These helpers accept whatever is there and
//! fall back to an empty value instead of failing the whole record.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::invoice::{FieldAliases, LineItem};

/// Largest magnitude accepted as an amount (10^18). Anything bigger is a
/// misread and would overflow the VAT and reconciliation arithmetic.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

/// Mandatory text field: missing or unusable values become an empty string.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_text(deserializer)?.unwrap_or_default())
}

/// Optional text field.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

/// Optional numeric field.
pub(crate) fn amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_amount(&value))
}

/// Nested record: anything but a JSON object yields the default record.
pub(crate) fn record<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default + FieldAliases,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        debug!("Expected an object, got {}; using empty record", kind_of(&value));
        return Ok(T::default());
    };
    Ok(map_object(map).unwrap_or_else(|e| {
        warn!("Could not map nested record: {}", e);
        T::default()
    }))
}

/// Line-item list: non-object entries are dropped.
pub(crate) fn line_items<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        debug!("Expected a line-item array, got {}", kind_of(&value));
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => map_object(map)
                .inspect_err(|e| warn!("Could not map line item: {}", e))
                .ok(),
            _ => None,
        })
        .collect())
}

/// Map one object after collapsing alias collisions.
pub(crate) fn map_object<T>(mut map: Map<String, Value>) -> serde_json::Result<T>
where
    T: DeserializeOwned + FieldAliases,
{
    resolve_aliases::<T>(&mut map);
    serde_json::from_value(Value::Object(map))
}

/// Keep one key per field when the model sent both the canonical name and
/// an alias. The first non-null value wins, canonical name first.
pub(crate) fn resolve_aliases<T: FieldAliases>(map: &mut Map<String, Value>) {
    for (canonical, aliases) in T::ALIASES {
        let present: Vec<&str> = std::iter::once(*canonical)
            .chain(aliases.iter().copied())
            .filter(|key| map.contains_key(*key))
            .collect();
        if present.len() < 2 {
            continue;
        }

        let keep = present
            .iter()
            .copied()
            .find(|key| !map[*key].is_null())
            .unwrap_or(present[0]);
        for key in present.into_iter().filter(|key| *key != keep) {
            debug!(field = canonical, kept = keep, dropped = key, "Duplicate field name");
            map.remove(key);
        }
    }
}

/// Render a scalar as trimmed text. `null`, blanks and the literal word
/// "null" (which models copy from prompt templates) map to `None`.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty()
                || trimmed.eq_ignore_ascii_case("null")
                || trimmed.eq_ignore_ascii_case("none")
                || trimmed.eq_ignore_ascii_case("n/a")
            {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read a JSON number or numeric string as an exact decimal. Magnitudes
/// above [`MAX_AMOUNT`] are rejected.
pub fn value_to_amount(value: &Value) -> Option<Decimal> {
    let amount = decimal_of(value)?;
    if amount.abs() > MAX_AMOUNT {
        debug!("Amount {} out of range", amount);
        return None;
    }
    Some(amount)
}

fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Some(Decimal::from(u));
            }
            Decimal::from_str(&n.to_string())
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Parse an amount as printed on an invoice.
///
/// Handles `Rp`/`IDR` prefixes and both grouping conventions
/// (`8.000.000,50` and `8,000,000.50`). When only one separator kind is
/// present, a repeated separator or a single one followed by exactly three
/// digits is read as thousands grouping; otherwise it is the decimal point.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let negative = s.trim_start().starts_with('-');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => single_separator(&cleaned, ','),
        (None, Some(_)) => single_separator(&cleaned, '.'),
        (None, None) => cleaned,
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

fn single_separator(cleaned: &str, sep: char) -> String {
    let count = cleaned.matches(sep).count();
    let digits_after = cleaned
        .rfind(sep)
        .map(|pos| cleaned.len() - pos - 1)
        .unwrap_or(0);

    if count > 1 || digits_after == 3 {
        cleaned.replace(sep, "")
    } else {
        cleaned.replace(sep, ".")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_grouping() {
        assert_eq!(parse_amount("Rp 8.000.000,00"), Some(dec("8000000.00")));
        assert_eq!(parse_amount("8,000,000.50"), Some(dec("8000000.50")));
        assert_eq!(parse_amount("IDR 8.000.000"), Some(dec("8000000")));
        assert_eq!(parse_amount("1.234"), Some(dec("1234")));
        assert_eq!(parse_amount("12,5"), Some(dec("12.5")));
        assert_eq!(parse_amount("99.99"), Some(dec("99.99")));
        assert_eq!(parse_amount("-150"), Some(dec("-150")));
    }

    #[test]
    fn test_parse_amount_rejects_text() {
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount(".,"), None);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("  PT Maju  ")), Some("PT Maju".to_string()));
        assert_eq!(value_to_text(&json!(12345)), Some("12345".to_string()));
        assert_eq!(value_to_text(&json!("null")), None);
        assert_eq!(value_to_text(&json!("")), None);
        assert_eq!(value_to_text(&json!(null)), None);
        assert_eq!(value_to_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_value_to_amount() {
        assert_eq!(value_to_amount(&json!(111)), Some(dec("111")));
        assert_eq!(value_to_amount(&json!(12.5)), Some(dec("12.5")));
        assert_eq!(value_to_amount(&json!("1.500.000")), Some(dec("1500000")));
        assert_eq!(value_to_amount(&json!(null)), None);
        assert_eq!(value_to_amount(&json!([1])), None);
    }

    #[test]
    fn test_value_to_amount_range() {
        assert_eq!(value_to_amount(&json!("1000000000000000000")), Some(MAX_AMOUNT));
        assert_eq!(value_to_amount(&json!("900000000000000000000000000")), None);
        assert_eq!(value_to_amount(&json!(-1e27)), None);
        assert_eq!(value_to_amount(&json!(u64::MAX)), None);
    }

    #[test]
    fn test_resolve_aliases() {
        let mut map = json!({
            "amount": null,
            "description": "Pen",
            "item_description": "Pen (blue)",
            "total": 5
        });
        let map = map.as_object_mut().unwrap();
        resolve_aliases::<LineItem>(map);

        assert_eq!(map.get("description"), Some(&json!("Pen")));
        assert!(!map.contains_key("item_description"));
        assert_eq!(map.get("total"), Some(&json!(5)));
        assert!(!map.contains_key("amount"));

        let item: LineItem = map_object(map.clone()).unwrap();
        assert_eq!(item.amount, Some(dec("5")));
    }
}
