use serde_json::Value;

pub const UNKNOWN_COMPANY: &str = "unknown_company";
pub const UNKNOWN_YEAR: &str = "unknown_year";

/// Best-effort conversion of a loosely typed value into a finite `f64`.
///
/// Strings are cleaned the way accountants write numbers: thousands
/// separators and `$` are dropped and a parenthesized amount is negative,
/// so `"(1,234.50)"` becomes `-1234.5`. Anything that does not survive that
/// cleanup, or is not finite, yields `None`.
pub fn safe_num(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        other => parse_amount(&other.to_string()),
    }
}

/// Parses a currency-like string. See [`safe_num`].
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ')'))
        .map(|c| if c == '(' { '-' } else { c })
        .collect();

    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Coerces a year-like value into an integer year.
///
/// Integers pass through, finite floats are truncated, strings must hold a
/// plain integer.
pub fn ensure_int_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64()
                    .filter(|v| v.is_finite())
                    .and_then(|v| i32::try_from(v.trunc() as i64).ok())
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Formats a dollar amount with thousands separators and two decimals.
/// Absent values render as `"N/A"`.
pub fn format_usd(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "N/A".to_string();
    };

    let fixed = format!("{:.2}", v.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let negative = v < 0.0 && fixed != "0.00";
    format!(
        "{}${}.{}",
        if negative { "-" } else { "" },
        group_digits(whole),
        cents
    )
}

/// Integer with thousands separators, e.g. a headcount.
pub fn format_count(n: i64) -> String {
    let digits = group_digits(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Turns a company name into something safe to embed in a file name.
pub fn sanitize_company(name: Option<&str>) -> String {
    let trimmed = name.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return UNKNOWN_COMPANY.to_string();
    }

    trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
