//! Custom Askama template filters.
//!
//! The `#[askama::filter_fn]` attribute turns each function into a filter
//! builder, so the formatting logic lives in plain functions the filters
//! wrap (and the tests exercise directly).

#![allow(clippy::unnecessary_wraps)]

use std::borrow::Borrow;
use std::fmt::Display;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount as a dollar price with two decimal places.
///
/// Accepts the value borrowed or owned: templates pipe both struct fields
/// and method return values through this filter.
///
/// Usage in templates: `{{ product.price|usd }}`
#[askama::filter_fn]
pub fn usd(value: impl Borrow<Decimal>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_usd(*value.borrow()))
}

fn format_usd(value: Decimal) -> String {
    format!("${value:.2}")
}

/// Formats an API timestamp for display.
///
/// The API has sent timestamps both with and without a timezone suffix, so
/// parsing is lenient; unparseable input is shown as-is.
///
/// Usage in templates: `{{ purchase.created_at|display_date }}`
#[askama::filter_fn]
pub fn display_date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_date(&value.to_string()))
}

fn format_date(raw: &str) -> String {
    let parsed = chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S GMT"));

    match parsed {
        Ok(dt) => dt.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_pads_to_two_decimals() {
        let price: Decimal = "12.5".parse().unwrap();
        assert_eq!(format_usd(price), "$12.50");

        let whole: Decimal = "7".parse().unwrap();
        assert_eq!(format_usd(whole), "$7.00");
    }

    #[test]
    fn test_display_date_parses_iso_timestamp() {
        assert_eq!(format_date("2026-03-14T09:26:53"), "March 14, 2026");
    }

    #[test]
    fn test_display_date_parses_http_timestamp() {
        assert_eq!(format_date("Sat, 14 Mar 2026 09:26:53 GMT"), "March 14, 2026");
    }

    #[test]
    fn test_display_date_passes_through_garbage() {
        assert_eq!(format_date("yesterday"), "yesterday");
    }
}
