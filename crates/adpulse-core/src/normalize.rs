//! Normalization from raw source payloads to [`CanonicalMetric`].
//!
//! Raw records arrive as loose JSON objects whose field names vary by
//! platform (Meta Ads, GA4, Google Ads). This module reconciles the known
//! aliases, parses dates, coerces numerics, and validates required fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::CanonicalMetric;

/// Date formats tried in fixed order. The `%m/%d/%Y` pattern is tried before
/// `%d/%m/%Y`, so an ambiguous `01/02/2024` parses as January 2nd. This
/// ordering is frozen for compatibility with upstream exports; no locale
/// inference is attempted.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("raw record must be a JSON object")]
    NotAnObject,
    #[error("{field} is required for source {source_name}")]
    MissingField { field: &'static str, source_name: String },
    #[error("unable to parse date: {value}")]
    UnparseableDate { value: String },
    #[error("invalid {field} value: {value}")]
    InvalidNumeric { field: &'static str, value: String },
    #[error("{field} must be non-negative (got: {value})")]
    NegativeValue { field: &'static str, value: String },
}

/// Normalizes a raw source record into a [`CanonicalMetric`].
///
/// Alias resolution is first-present-wins: `campaign` over `campaign_name`,
/// `date` over `date_start`, `spend` over `cost`, `revenue` over `value`,
/// `conversions` over `purchases`. Missing numeric fields default to zero;
/// `status` defaults to `"active"`.
///
/// # Errors
///
/// Returns [`ValidationError`] when `external_id` or the campaign name
/// resolve to empty, the date is missing or unparseable, or a numeric field
/// cannot be coerced or is negative.
pub fn normalize_metric(raw: &Value, source: &str) -> Result<CanonicalMetric, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let external_id = pick(obj, &["external_id"])
        .and_then(text_value)
        .unwrap_or_default();
    if external_id.is_empty() {
        return Err(ValidationError::MissingField {
            field: "external_id",
            source_name: source.to_string(),
        });
    }

    let campaign_name = pick(obj, &["campaign", "campaign_name"])
        .and_then(text_value)
        .unwrap_or_default();
    if campaign_name.is_empty() {
        return Err(ValidationError::MissingField {
            field: "campaign_name",
            source_name: source.to_string(),
        });
    }

    let date = match pick(obj, &["date", "date_start"]) {
        Some(value) => parse_metric_date(value)?,
        None => {
            return Err(ValidationError::MissingField {
                field: "date",
                source_name: source.to_string(),
            })
        }
    };

    let impressions = coerce_count("impressions", pick(obj, &["impressions"]))?;
    let clicks = coerce_count("clicks", pick(obj, &["clicks"]))?;
    let spend = coerce_money("spend", pick(obj, &["spend", "cost"]))?;
    let conversions = coerce_count("conversions", pick(obj, &["conversions", "purchases"]))?;
    let revenue = coerce_money("revenue", pick(obj, &["revenue", "value"]))?;

    let status = pick(obj, &["status"])
        .and_then(text_value)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "active".to_string());

    Ok(CanonicalMetric {
        external_id,
        campaign_name,
        date,
        impressions,
        clicks,
        spend,
        conversions,
        revenue,
        source: source.to_string(),
        status,
    })
}

/// Parses a date value from a raw record.
///
/// String values try [`DATE_FORMATS`] in order; first successful parse wins.
/// Datetime strings (RFC 3339 or `YYYY-MM-DDTHH:MM:SS`-style) are accepted
/// and truncated to their date component.
///
/// # Errors
///
/// Returns [`ValidationError::UnparseableDate`] for non-string values or
/// strings matching no known format.
pub fn parse_metric_date(value: &Value) -> Result<NaiveDate, ValidationError> {
    let Some(s) = value.as_str() else {
        return Err(ValidationError::UnparseableDate {
            value: value.to_string(),
        });
    };
    let s = s.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // Datetime fallbacks, truncated to the date component.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(ValidationError::UnparseableDate {
        value: s.to_string(),
    })
}

/// Returns the first key in `keys` that is present with a non-null value.
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

/// Renders a scalar JSON value as trimmed text. Objects and arrays are not
/// valid identifier/name material and yield `None`.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_count(field: &'static str, value: Option<&Value>) -> Result<i64, ValidationError> {
    let Some(value) = value else {
        return Ok(0);
    };

    let invalid = || ValidationError::InvalidNumeric {
        field,
        value: value.to_string(),
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(truncate_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate_to_i64))
        }
        _ => None,
    };

    let parsed = parsed.ok_or_else(invalid)?;
    if parsed < 0 {
        return Err(ValidationError::NegativeValue {
            field,
            value: parsed.to_string(),
        });
    }
    Ok(parsed)
}

fn coerce_money(field: &'static str, value: Option<&Value>) -> Result<Decimal, ValidationError> {
    let Some(value) = value else {
        return Ok(Decimal::ZERO);
    };

    let invalid = || ValidationError::InvalidNumeric {
        field,
        value: value.to_string(),
    };

    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(Decimal::ZERO);
            }
            parse_decimal(s)
        }
        _ => None,
    };

    let parsed = parsed.ok_or_else(invalid)?;
    if parsed.is_sign_negative() && !parsed.is_zero() {
        return Err(ValidationError::NegativeValue {
            field,
            value: parsed.to_string(),
        });
    }
    Ok(parsed)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_to_i64(f: f64) -> i64 {
    f.trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta_record() -> Value {
        json!({
            "external_id": "meta_ads_123456",
            "campaign": "Summer Sale Campaign",
            "date": "2024-06-01",
            "impressions": 10_000,
            "clicks": 300,
            "spend": 500.50,
            "conversions": 12,
            "revenue": 2000.75,
            "status": "active",
        })
    }

    // -----------------------------------------------------------------------
    // Alias precedence
    // -----------------------------------------------------------------------

    #[test]
    fn campaign_wins_over_campaign_name() {
        let mut raw = meta_record();
        raw["campaign_name"] = json!("Shadow Name");
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.campaign_name, "Summer Sale Campaign");
    }

    #[test]
    fn campaign_name_used_when_campaign_absent() {
        let raw = json!({
            "external_id": "ga4_1",
            "campaign_name": "Organic Search",
            "date": "2024-06-01",
        });
        let canonical = normalize_metric(&raw, "ga4").unwrap();
        assert_eq!(canonical.campaign_name, "Organic Search");
    }

    #[test]
    fn spend_wins_over_cost() {
        let mut raw = meta_record();
        raw["cost"] = json!(999.99);
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.spend, Decimal::new(50_050, 2));
    }

    #[test]
    fn cost_used_when_spend_absent() {
        let raw = json!({
            "external_id": "g_1",
            "campaign": "Brand",
            "date": "2024-06-01",
            "cost": "123.45",
        });
        let canonical = normalize_metric(&raw, "google_ads").unwrap();
        assert_eq!(canonical.spend, Decimal::new(12_345, 2));
    }

    #[test]
    fn revenue_wins_over_value() {
        let mut raw = meta_record();
        raw["value"] = json!(1.0);
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.revenue, Decimal::new(200_075, 2));
    }

    #[test]
    fn conversions_wins_over_purchases() {
        let mut raw = meta_record();
        raw["purchases"] = json!(99);
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.conversions, 12);
    }

    #[test]
    fn purchases_used_when_conversions_absent() {
        let raw = json!({
            "external_id": "ga4_1",
            "campaign_name": "Paid Search",
            "date_start": "2024-06-01",
            "purchases": 7,
        });
        let canonical = normalize_metric(&raw, "ga4").unwrap();
        assert_eq!(canonical.conversions, 7);
    }

    #[test]
    fn date_wins_over_date_start() {
        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-02",
            "date_start": "2024-06-01",
        });
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(
            canonical.date,
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
        );
    }

    // -----------------------------------------------------------------------
    // Date parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parses_iso_date() {
        let date = parse_metric_date(&json!("2024-01-02")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn parses_slash_iso_date() {
        let date = parse_metric_date(&json!("2024/01/02")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn ambiguous_slash_date_parses_month_first() {
        // 01/02/2024 is January 2nd: the month/day pattern is tried before
        // day/month. Non-locale-aware by policy.
        let date = parse_metric_date(&json!("01/02/2024")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn day_month_pattern_catches_impossible_months() {
        let date = parse_metric_date(&json!("25/12/2024")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
    }

    #[test]
    fn datetime_truncates_to_date() {
        let date = parse_metric_date(&json!("2024-06-01T13:45:00Z")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let date = parse_metric_date(&json!("2024-06-01 13:45:00")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let err = parse_metric_date(&json!("June 1st, 2024")).unwrap_err();
        assert!(matches!(err, ValidationError::UnparseableDate { .. }));

        let err = parse_metric_date(&json!(20_240_601)).unwrap_err();
        assert!(matches!(err, ValidationError::UnparseableDate { .. }));
    }

    // -----------------------------------------------------------------------
    // Required fields
    // -----------------------------------------------------------------------

    #[test]
    fn missing_external_id_is_rejected() {
        let raw = json!({ "campaign": "C", "date": "2024-06-01" });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(
            matches!(err, ValidationError::MissingField { field: "external_id", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn empty_external_id_is_rejected() {
        let raw = json!({ "external_id": "  ", "campaign": "C", "date": "2024-06-01" });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "external_id", .. }
        ));
    }

    #[test]
    fn missing_campaign_name_is_rejected() {
        let raw = json!({ "external_id": "x", "date": "2024-06-01" });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "campaign_name", .. }
        ));
    }

    #[test]
    fn missing_date_is_rejected() {
        let raw = json!({ "external_id": "x", "campaign": "C" });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "date", .. }
        ));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = normalize_metric(&json!([1, 2, 3]), "meta_ads").unwrap_err();
        assert!(matches!(err, ValidationError::NotAnObject));
    }

    // -----------------------------------------------------------------------
    // Numeric coercion
    // -----------------------------------------------------------------------

    #[test]
    fn missing_numerics_default_to_zero() {
        let raw = json!({ "external_id": "x", "campaign": "C", "date": "2024-06-01" });
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.impressions, 0);
        assert_eq!(canonical.clicks, 0);
        assert_eq!(canonical.spend, Decimal::ZERO);
        assert_eq!(canonical.conversions, 0);
        assert_eq!(canonical.revenue, Decimal::ZERO);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-01",
            "impressions": "10000",
            "clicks": "300.0",
            "spend": "500.50",
        });
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.impressions, 10_000);
        assert_eq!(canonical.clicks, 300);
        assert_eq!(canonical.spend, Decimal::new(50_050, 2));
    }

    #[test]
    fn float_counts_truncate() {
        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-01",
            "conversions": 12.9,
        });
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.conversions, 12);
    }

    #[test]
    fn invalid_numeric_names_the_field() {
        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-01",
            "clicks": "three hundred",
        });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidNumeric { field: "clicks", .. }
        ));

        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-01",
            "spend": true,
        });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidNumeric { field: "spend", .. }
        ));
    }

    #[test]
    fn negative_values_are_rejected() {
        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-01",
            "impressions": -5,
        });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeValue { field: "impressions", .. }
        ));

        let raw = json!({
            "external_id": "x",
            "campaign": "C",
            "date": "2024-06-01",
            "revenue": "-1.00",
        });
        let err = normalize_metric(&raw, "meta_ads").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeValue { field: "revenue", .. }
        ));
    }

    // -----------------------------------------------------------------------
    // Defaults and passthrough
    // -----------------------------------------------------------------------

    #[test]
    fn status_defaults_to_active() {
        let raw = json!({ "external_id": "x", "campaign": "C", "date": "2024-06-01" });
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.status, "active");
    }

    #[test]
    fn numeric_external_id_renders_as_text() {
        let raw = json!({ "external_id": 123_456, "campaign": "C", "date": "2024-06-01" });
        let canonical = normalize_metric(&raw, "meta_ads").unwrap();
        assert_eq!(canonical.external_id, "123456");
    }

    #[test]
    fn source_is_carried_through() {
        let canonical = normalize_metric(&meta_record(), "meta_ads").unwrap();
        assert_eq!(canonical.source, "meta_ads");
    }
}
