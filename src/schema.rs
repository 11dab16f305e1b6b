use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A loosely typed JSON object as returned by the model (historical rows,
/// segment breakdowns).
pub type JsonRecord = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    /// Form 10-K, the annual report.
    Annual,
    /// Form 8-K, the current report of a material event.
    Current,
}

impl ReportKind {
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Annual => "annual_report",
            Self::Current => "8k_report",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "10-K"),
            Self::Current => write!(f, "8-K"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "10-k" | "10k" | "annual" => Ok(Self::Annual),
            "8-k" | "8k" | "current" => Ok(Self::Current),
            other => Err(format!(
                "unknown report kind '{}': expected 10-K or 8-K",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnualReport {
    #[serde(default)]
    #[schemars(description = "Exact legal name of the company")]
    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "coerce::opt_text")]
    #[schemars(with = "Option<String>", description = "SEC Central Index Key")]
    pub cik: Option<String>,

    #[serde(default, deserialize_with = "coerce::opt_date")]
    #[schemars(with = "Option<NaiveDate>", description = "Fiscal year end date, YYYY-MM-DD")]
    pub fiscal_year_end: Option<NaiveDate>,

    #[serde(default, deserialize_with = "coerce::opt_date")]
    #[schemars(with = "Option<NaiveDate>", description = "Filing date, YYYY-MM-DD")]
    pub filing_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "coerce::opt_f64")]
    #[schemars(with = "Option<f64>", description = "Latest fiscal year total revenue in USD")]
    pub total_revenue: Option<f64>,

    #[serde(default, deserialize_with = "coerce::opt_f64")]
    #[schemars(with = "Option<f64>", description = "Latest fiscal year net income in USD")]
    pub net_income: Option<f64>,

    #[serde(default, deserialize_with = "coerce::opt_f64")]
    #[schemars(with = "Option<f64>", description = "Total assets at fiscal year end in USD")]
    pub total_assets: Option<f64>,

    #[serde(default, deserialize_with = "coerce::opt_f64")]
    #[schemars(with = "Option<f64>", description = "Total liabilities at fiscal year end in USD")]
    pub total_liabilities: Option<f64>,

    #[serde(default, deserialize_with = "coerce::opt_f64")]
    #[schemars(with = "Option<f64>", description = "Net cash from operating activities in USD")]
    pub operating_cash_flow: Option<f64>,

    #[serde(default, deserialize_with = "coerce::opt_f64")]
    #[schemars(with = "Option<f64>", description = "Cash and cash equivalents in USD")]
    pub cash_and_equivalents: Option<f64>,

    #[serde(default, deserialize_with = "coerce::opt_i64")]
    #[schemars(with = "Option<i64>", description = "Number of full-time employees")]
    pub num_employees: Option<i64>,

    #[serde(default)]
    #[schemars(description = "Independent registered public accounting firm")]
    pub auditor: Option<String>,

    #[serde(default)]
    pub business_description: Option<String>,

    #[serde(default)]
    pub risk_factors: Option<Vec<String>>,

    #[serde(default)]
    pub management_discussion: Option<String>,

    #[serde(default)]
    pub executive_summary: Option<String>,

    #[serde(default)]
    #[schemars(description = "One object per reportable segment, e.g. {\"Segment\": \"Services\", \"Revenue\": 85200000000}")]
    pub segment_performance: Option<Vec<JsonRecord>>,

    #[serde(default)]
    pub insights: Option<Vec<String>>,

    #[serde(default)]
    pub opportunities: Option<Vec<String>>,

    #[serde(default)]
    pub risks: Option<Vec<String>>,

    #[serde(default)]
    pub takeaways: Option<Vec<String>>,

    #[serde(default)]
    #[schemars(
        description = "One object per fiscal year with the keys \"Year\", \"Total Revenue\", \"Net Income\", \"Total Assets\", \"Total Liabilities\", \"Equity\" and \"Cash Flow\". Values are numeric."
    )]
    pub historical_financials: Option<Vec<JsonRecord>>,
}

impl AnnualReport {
    pub fn fiscal_year(&self) -> Option<i32> {
        self.fiscal_year_end.map(|d| d.year())
    }

    pub fn historical_rows(&self) -> &[JsonRecord] {
        self.historical_financials.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EightKReport {
    #[serde(default)]
    #[schemars(description = "Exact legal name of the company")]
    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "coerce::opt_text")]
    #[schemars(with = "Option<String>", description = "SEC Central Index Key")]
    pub cik: Option<String>,

    #[serde(default, deserialize_with = "coerce::opt_date")]
    #[schemars(with = "Option<NaiveDate>", description = "Filing date, YYYY-MM-DD")]
    pub filing_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Detailed description of the reported event")]
    pub event_description: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "One of \"Very Positive\", \"Positive\", \"Neutral\", \"Negative\", \"Very Negative\""
    )]
    pub impact: Option<String>,

    #[serde(default)]
    pub insights: Option<Vec<String>>,

    #[serde(default)]
    pub opportunities: Option<Vec<String>>,

    #[serde(default)]
    pub risks: Option<Vec<String>>,

    #[serde(default)]
    pub takeaways: Option<Vec<String>>,
}

impl EightKReport {
    pub fn filing_year(&self) -> Option<i32> {
        self.filing_date.map(|d| d.year())
    }

    pub fn impact_class(&self) -> ImpactClass {
        ImpactClass::from_label(self.impact.as_deref())
    }
}

/// Visual bucket of an 8-K impact label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactClass {
    Positive,
    Neutral,
    Negative,
}

impl ImpactClass {
    /// Case-insensitive match against the five labels the model is asked for.
    /// Anything else, including a missing label, is neutral.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::to_lowercase).as_deref() {
            Some("very positive" | "positive") => Self::Positive,
            Some("negative" | "very negative") => Self::Negative,
            _ => Self::Neutral,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Typed result of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilingReport {
    Annual(AnnualReport),
    Current(EightKReport),
}

impl FilingReport {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Annual(_) => ReportKind::Annual,
            Self::Current(_) => ReportKind::Current,
        }
    }

    pub fn company_name(&self) -> Option<&str> {
        match self {
            Self::Annual(r) => r.company_name.as_deref(),
            Self::Current(r) => r.company_name.as_deref(),
        }
    }

    /// Fiscal year for a 10-K, filing year for an 8-K.
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Annual(r) => r.fiscal_year(),
            Self::Current(r) => r.filing_year(),
        }
    }
}

pub fn schema_as_json(kind: ReportKind) -> Result<String, serde_json::Error> {
    let schema = match kind {
        ReportKind::Annual => schemars::schema_for!(AnnualReport),
        ReportKind::Current => schemars::schema_for!(EightKReport),
    };
    serde_json::to_string_pretty(&schema)
}

/// Lax field coercions applied while validating model output.
mod coerce {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("number {} out of range", n))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, found {:?}", s))),
            Some(other) => Err(D::Error::custom(format!(
                "expected a number, found {}",
                other
            ))),
        }
    }

    pub(super) fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Some(i));
                }
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
                    _ => Err(D::Error::custom(format!("expected an integer, found {}", n))),
                }
            }
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, found {:?}", s))),
            Some(other) => Err(D::Error::custom(format!(
                "expected an integer, found {}",
                other
            ))),
        }
    }

    pub(super) fn opt_date<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => parse_date(s.trim())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a YYYY-MM-DD date, found {:?}", s))),
            Some(other) => Err(D::Error::custom(format!(
                "expected a date string, found {}",
                other
            ))),
        }
    }

    pub(super) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "expected a string, found {}",
                other
            ))),
        }
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|dt| dt.date())
            })
    }
}
