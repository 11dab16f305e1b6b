use crate::error::{Result, SummarizerError};
use log::error;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parses and validates a model response into `T`.
///
/// A non-empty array is unwrapped to its first element; an object is used
/// as-is; anything else is a format error.
pub fn parse_report<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(SummarizerError::Parse)?;

    let record = match value {
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => return Err(SummarizerError::Format("empty JSON array".to_string())),
        },
        obj @ Value::Object(_) => obj,
        other => {
            return Err(SummarizerError::Format(format!(
                "expected an object or a list of objects, found {}",
                json_kind(&other)
            )))
        }
    };

    serde_json::from_value(record).map_err(SummarizerError::Validation)
}

/// Fail-open variant of [`parse_report`]: every error is logged and replaced
/// by the empty record, so rendering always has something to work with.
pub fn parse_report_or_default<T: DeserializeOwned + Default>(raw: &str) -> T {
    match parse_report(raw) {
        Ok(report) => report,
        Err(e) => {
            error!("Error processing AI response: {}", e);
            T::default()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
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
    use crate::schema::{AnnualReport, EightKReport};

    const EIGHT_K: &str = r#"{
        "company_name": "Acme Corp",
        "cik": "0000123456",
        "filing_date": "2024-03-01",
        "event_description": "Acme completed the acquisition of Widget Co.",
        "impact": "Positive",
        "insights": ["a", "b", "c"],
        "opportunities": ["x", "y"],
        "risks": ["r1", "r2"],
        "takeaways": ["t1", "t2", "t3"]
    }"#;

    #[test]
    fn test_single_element_list_matches_object() {
        let direct: EightKReport = parse_report(EIGHT_K).unwrap();
        let wrapped: EightKReport = parse_report(&format!("[{}]", EIGHT_K)).unwrap();
        assert_eq!(direct, wrapped);
        assert_eq!(direct.company_name.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_only_first_list_element_is_used() {
        let report: EightKReport =
            parse_report(r#"[{"company_name": "First"}, {"company_name": "Second"}]"#).unwrap();
        assert_eq!(report.company_name.as_deref(), Some("First"));
    }

    #[test]
    fn test_error_taxonomy() {
        assert!(matches!(
            parse_report::<EightKReport>("{not json"),
            Err(SummarizerError::Parse(_))
        ));
        assert!(matches!(
            parse_report::<EightKReport>("[]"),
            Err(SummarizerError::Format(_))
        ));
        assert!(matches!(
            parse_report::<EightKReport>("\"just a string\""),
            Err(SummarizerError::Format(_))
        ));
        assert!(matches!(
            parse_report::<EightKReport>("42"),
            Err(SummarizerError::Format(_))
        ));
        assert!(matches!(
            parse_report::<EightKReport>(r#"{"insights": "not a list"}"#),
            Err(SummarizerError::Validation(_))
        ));
        assert!(matches!(
            parse_report::<EightKReport>("[42]"),
            Err(SummarizerError::Validation(_))
        ));
    }

    #[test]
    fn test_fail_open_yields_default() {
        for raw in ["", "{not json", "[]", "null", "true", r#"{"total_revenue": {"a": 1}}"#] {
            let report: AnnualReport = parse_report_or_default(raw);
            assert_eq!(report, AnnualReport::default(), "input {:?}", raw);
        }
    }

    #[test]
    fn test_mapping_without_known_fields_is_default() {
        let report: AnnualReport = parse_report_or_default(r#"{"foo": 1, "bar": [1, 2]}"#);
        assert_eq!(report, AnnualReport::default());
    }
}
