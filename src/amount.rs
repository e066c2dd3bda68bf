use crate::types::RawRecord;
use serde_json::Value;

/// Candidate fields for the monetary amount, in priority order
pub const AMOUNT_FIELDS: &[&str] = &["amount", "award_amount", "total_amount", "value", "budget"];

/// Extract a monetary amount from whichever candidate field parses first.
///
/// Numbers are taken as-is; strings are stripped of `$`, `,` and surrounding
/// whitespace. An unparseable candidate falls through to the next one. Returns
/// `None` when nothing parses.
pub fn parse_amount(raw: &RawRecord) -> Option<f64> {
    AMOUNT_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .find_map(amount_from_value)
}

fn amount_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_currency(s),
        _ => None,
    }
}

fn parse_currency(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    // "NaN" and "inf" parse as f64 but are not amounts
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_common_representations() {
        assert_eq!(parse_amount(&raw(json!({"amount": 5000000}))), Some(5000000.0));
        assert_eq!(parse_amount(&raw(json!({"amount": "$5,000,000"}))), Some(5000000.0));
        assert_eq!(parse_amount(&raw(json!({"amount": "5000000.00"}))), Some(5000000.0));
        assert_eq!(parse_amount(&raw(json!({"amount": "N/A"}))), None);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_amount(&raw(json!({"budget": "  $1,250.50 "}))), Some(1250.5));
    }

    #[test]
    fn unparseable_candidate_falls_through() {
        let r = raw(json!({"amount": "TBD", "award_amount": "$75,000"}));
        assert_eq!(parse_amount(&r), Some(75000.0));
    }

    #[test]
    fn non_finite_strings_fall_through() {
        let r = raw(json!({"amount": "NaN", "award_amount": "$10"}));
        assert_eq!(parse_amount(&r), Some(10.0));
        assert_eq!(parse_amount(&raw(json!({"amount": "inf"}))), None);
        assert_eq!(parse_amount(&raw(json!({"total_amount": "-Infinity"}))), None);
    }

    #[test]
    fn candidate_order_wins() {
        let r = raw(json!({"budget": 1, "total_amount": 2, "award_amount": 3}));
        assert_eq!(parse_amount(&r), Some(3.0));
    }

    #[test]
    fn absent_or_non_scalar_is_none() {
        assert_eq!(parse_amount(&raw(json!({"title": "no money here"}))), None);
        assert_eq!(parse_amount(&raw(json!({"amount": null, "value": {"usd": 10}}))), None);
        assert_eq!(parse_amount(&raw(json!({"amount": ""}))), None);
    }
}
