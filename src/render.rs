use crate::charts::{ChartArtifacts, FinancialTable};
use crate::error::Result;
use crate::schema::{AnnualReport, EightKReport, FilingReport, JsonRecord};
use crate::utils::{format_count, format_usd, safe_num};
use chrono::NaiveDate;
use log::warn;
use minijinja::Environment;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use url::Url;

pub const ANNUAL_TEMPLATE: &str = "annual_report.html";
pub const CURRENT_TEMPLATE: &str = "current_report.html";

const NOT_AVAILABLE: &str = "N/A";

/// Fills the embedded HTML templates. The `.html` names turn on
/// auto-escaping, so model output never reaches the page unescaped.
pub struct ReportRenderer {
    env: Environment<'static>,
}

impl ReportRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(ANNUAL_TEMPLATE, include_str!("../templates/annual_report.html"))?;
        env.add_template(CURRENT_TEMPLATE, include_str!("../templates/current_report.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, report: &FilingReport, charts: &ChartArtifacts) -> Result<String> {
        match report {
            FilingReport::Annual(r) => self.render_annual(r, charts),
            FilingReport::Current(r) => self.render_current(r),
        }
    }

    pub fn render_annual(&self, report: &AnnualReport, charts: &ChartArtifacts) -> Result<String> {
        let view = AnnualView::new(report, charts);
        Ok(self.env.get_template(ANNUAL_TEMPLATE)?.render(view)?)
    }

    pub fn render_current(&self, report: &EightKReport) -> Result<String> {
        let view = CurrentView::new(report);
        Ok(self.env.get_template(CURRENT_TEMPLATE)?.render(view)?)
    }
}

#[derive(Serialize)]
struct AnnualView<'a> {
    company_name: &'a str,
    year: String,
    cik: &'a str,
    filing_date: String,
    fiscal_year_end: String,
    executive_summary: &'a str,
    business_description: &'a str,
    management_discussion: &'a str,
    auditor: &'a str,
    num_employees: String,
    total_revenue: String,
    net_income: String,
    total_assets: String,
    total_liabilities: String,
    operating_cash_flow: String,
    cash_and_equivalents: String,
    historical: Vec<HistoricalRowView>,
    chart_path: Option<String>,
    yoy_path: Option<String>,
    segments: Vec<Vec<Cell>>,
    insights: &'a [String],
    opportunities: &'a [String],
    risks: &'a [String],
    takeaways: &'a [String],
    risk_factors: &'a [String],
}

impl<'a> AnnualView<'a> {
    fn new(r: &'a AnnualReport, charts: &ChartArtifacts) -> Self {
        let historical = FinancialTable::from_rows(r.historical_rows())
            .rows()
            .iter()
            .map(|row| HistoricalRowView {
                year: row
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                total_revenue: format_usd(row.total_revenue),
                net_income: format_usd(row.net_income),
                total_assets: format_usd(row.total_assets),
                total_liabilities: format_usd(row.total_liabilities),
                equity: format_usd(row.equity),
                cash_flow: format_usd(row.cash_flow),
            })
            .collect();

        Self {
            company_name: text(&r.company_name),
            year: r
                .fiscal_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            cik: text(&r.cik),
            filing_date: date(r.filing_date),
            fiscal_year_end: date(r.fiscal_year_end),
            executive_summary: text(&r.executive_summary),
            business_description: text(&r.business_description),
            management_discussion: text(&r.management_discussion),
            auditor: text(&r.auditor),
            num_employees: r
                .num_employees
                .map(format_count)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            total_revenue: format_usd(r.total_revenue),
            net_income: format_usd(r.net_income),
            total_assets: format_usd(r.total_assets),
            total_liabilities: format_usd(r.total_liabilities),
            operating_cash_flow: format_usd(r.operating_cash_flow),
            cash_and_equivalents: format_usd(r.cash_and_equivalents),
            historical,
            chart_path: charts.revenue_netincome.as_deref().and_then(file_url),
            yoy_path: charts.yoy_changes.as_deref().and_then(file_url),
            segments: r
                .segment_performance
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(segment_cells)
                .collect(),
            insights: list(&r.insights),
            opportunities: list(&r.opportunities),
            risks: list(&r.risks),
            takeaways: list(&r.takeaways),
            risk_factors: list(&r.risk_factors),
        }
    }
}

#[derive(Serialize)]
struct HistoricalRowView {
    year: String,
    total_revenue: String,
    net_income: String,
    total_assets: String,
    total_liabilities: String,
    equity: String,
    cash_flow: String,
}

#[derive(Serialize)]
struct Cell {
    label: String,
    value: String,
}

#[derive(Serialize)]
struct CurrentView<'a> {
    company_name: &'a str,
    cik: &'a str,
    filing_date: String,
    event_description: &'a str,
    impact: &'a str,
    impact_class: &'static str,
    insights: &'a [String],
    opportunities: &'a [String],
    risks: &'a [String],
    takeaways: &'a [String],
}

impl<'a> CurrentView<'a> {
    fn new(r: &'a EightKReport) -> Self {
        Self {
            company_name: text(&r.company_name),
            cik: text(&r.cik),
            filing_date: date(r.filing_date),
            event_description: text(&r.event_description),
            impact: text(&r.impact),
            impact_class: r.impact_class().css_class(),
            insights: list(&r.insights),
            opportunities: list(&r.opportunities),
            risks: list(&r.risks),
            takeaways: list(&r.takeaways),
        }
    }
}

fn text(value: &Option<String>) -> &str {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

fn list(value: &Option<Vec<String>>) -> &[String] {
    value.as_deref().unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Absolute, percent-encoded `file://` URL. The HTML reaches the PDF
/// renderer without a base location, so relative paths would not resolve.
fn file_url(path: &Path) -> Option<String> {
    let absolute = match std::path::absolute(path) {
        Ok(p) => p,
        Err(e) => {
            warn!("Cannot resolve chart path {}: {}", path.display(), e);
            return None;
        }
    };
    match Url::from_file_path(&absolute) {
        Ok(url) => Some(url.to_string()),
        Err(()) => {
            warn!("Cannot build a file URL for {}", absolute.display());
            None
        }
    }
}

fn segment_cells(segment: &JsonRecord) -> Vec<Cell> {
    segment
        .iter()
        .map(|(label, value)| Cell {
            label: label.clone(),
            value: match value {
                Value::Null => NOT_AVAILABLE.to_string(),
                Value::String(s) => s.clone(),
                Value::Number(_) => format_usd(safe_num(value)),
                other => other.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::parse_report_or_default;
    use std::path::PathBuf;

    fn renderer() -> ReportRenderer {
        ReportRenderer::new().unwrap()
    }

    #[test]
    fn test_empty_annual_report_renders_placeholders() {
        let html = renderer()
            .render_annual(&AnnualReport::default(), &ChartArtifacts::default())
            .unwrap();
        assert!(html.contains("N/A Annual Report (N/A)"));
        assert!(html.contains("<p>N/A</p>"));
        assert!(!html.contains("<li>"));
        assert!(!html.contains("<img"));
        assert!(!html.contains("Historical Financials"));
        assert!(!html.contains("none"));
    }

    #[test]
    fn test_annual_report_with_history_and_charts() {
        let report: AnnualReport = parse_report_or_default(
            r#"{
                "company_name": "Apple Inc.",
                "fiscal_year_end": "2023-09-30",
                "total_revenue": 383285000000,
                "num_employees": 161000,
                "insights": ["Services revenue hit a record"],
                "segment_performance": [{"Segment": "Services", "Revenue": 85200000000}],
                "historical_financials": [
                    {"Year": 2023, "Total Revenue": 383285000000, "Net Income": 96995000000},
                    {"Year": 2022, "Total Revenue": "394,328,000,000", "Net Income": null}
                ]
            }"#,
        );
        let charts = ChartArtifacts {
            revenue_netincome: Some(PathBuf::from("/tmp/Apple_Inc._revenue_netincome_1.png")),
            yoy_changes: None,
        };

        let html = renderer().render_annual(&report, &charts).unwrap();
        assert!(html.contains("Apple Inc. Annual Report (2023)"));
        assert!(html.contains("$383,285,000,000.00"));
        assert!(html.contains("161,000"));
        assert!(html.contains("<li>Services revenue hit a record</li>"));
        assert!(html.contains("$85,200,000,000.00"));
        assert!(html.contains("Historical Financials"));
        assert!(html.contains("alt=\"Revenue & Net Income\""));
        assert!(!html.contains("alt=\"YoY Changes\""));
        assert!(html.contains("Apple_Inc._revenue_netincome_1.png"));
        // Table rows come out sorted by year.
        let pos_2022 = html.find("<td>2022</td>").unwrap();
        let pos_2023 = html.find("<td>2023</td>").unwrap();
        assert!(pos_2022 < pos_2023);
    }

    #[test]
    fn test_current_report_impact_classes() {
        let r = renderer();
        for (label, class) in [
            (Some("Very Positive"), "positive"),
            (Some("NEGATIVE"), "negative"),
            (Some("Neutral"), "neutral"),
            (Some("Transformational"), "neutral"),
            (None, "neutral"),
        ] {
            let report = EightKReport {
                impact: label.map(str::to_string),
                ..Default::default()
            };
            let html = r.render_current(&report).unwrap();
            assert!(
                html.contains(&format!("class=\"impact-card {}\"", class)),
                "label {:?}",
                label
            );
        }
    }

    #[test]
    fn test_model_output_is_escaped() {
        let report = EightKReport {
            company_name: Some("AT&T <script>".to_string()),
            risks: Some(vec!["<b>debt</b>".to_string()]),
            ..Default::default()
        };
        let html = renderer().render_current(&report).unwrap();
        assert!(html.contains("AT&amp;T &lt;script&gt;"));
        assert!(!html.contains("<b>debt</b>"));
    }

    #[test]
    fn test_relative_and_unusual_chart_paths_become_file_urls() {
        let report = AnnualReport {
            historical_financials: Some(vec![serde_json::from_str(
                r#"{"Year": 2023, "Total Revenue": 1000000000}"#,
            )
            .unwrap()]),
            ..Default::default()
        };
        let charts = ChartArtifacts {
            revenue_netincome: Some(PathBuf::from("./Acme_revenue_netincome_1.png")),
            yoy_changes: Some(PathBuf::from("/home/jo doe/Desktop/Acme#1_yoy.png")),
        };

        let html = renderer().render_annual(&report, &charts).unwrap();
        // Auto-escaping turns `/` into `&#x2f;`.
        assert!(!html.contains("file:&#x2f;&#x2f;.&#x2f;"));
        assert!(html.contains("Acme_revenue_netincome_1.png"));
        assert!(html.contains(
            "file:&#x2f;&#x2f;&#x2f;home&#x2f;jo%20doe&#x2f;Desktop&#x2f;Acme%231_yoy.png"
        ));

        let relative = file_url(Path::new("reports/chart.png")).unwrap();
        assert!(relative.starts_with("file:///"));
        assert!(relative.ends_with("/reports/chart.png"));
    }
}
