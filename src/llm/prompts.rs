// Extraction instructions for the two supported filing types.

use crate::schema::{schema_as_json, ReportKind};
use log::warn;

pub const ANNUAL_REPORT_INSTRUCTIONS: &str = r#"
You are a financial analyst. Analyze the following annual report (10-K) and produce structured output in JSON format.
The document contains the full text of a 10-K report.

## WHERE TO LOOK
- **Financial Highlights:** Use the latest year's values in the "Consolidated Statements of Operations", the "Consolidated Balance Sheets" and the "Consolidated Statements of Cash Flows".
- **Historical Financials:** Find the historical financial tables, typically in "Part II, Item 8. Financial Statements and Supplementary Data". Extract the data row-by-row for at least the last 3 years. Every row must include a "Year".
- **Company Profile:** The business description comes from "Part I, Item 1. Business"; the auditor is the independent registered public accounting firm signing the audit opinion; the employee count is usually under "Human Capital".
- **Insights:** Base your insights on a holistic analysis of the entire document.
- **Opportunities & Risks:** Take them from "Management's Discussion and Analysis of Financial Condition and Results of Operations" and "Risk Factors".
- **Takeaways:** A high-level summary of the most important points.

## FIELDS
- company_name: The exact company name.
- cik: The CIK number.
- fiscal_year_end: The fiscal year end date in YYYY-MM-DD format.
- filing_date: The filing date in YYYY-MM-DD format.
- total_revenue: Latest year's total revenue as a numeric value.
- net_income: Latest year's net income as a numeric value.
- total_assets: Latest year's total assets as a numeric value.
- total_liabilities: Latest year's total liabilities as a numeric value.
- operating_cash_flow: Latest year's operating cash flow as a numeric value.
- cash_and_equivalents: Latest year's cash and equivalents as a numeric value.
- num_employees: Number of employees as an integer.
- auditor: Name of the auditing firm.
- business_description: A short description of the business.
- management_discussion: A short summary of management's discussion and analysis.
- executive_summary: A comprehensive summary of the key findings, including the business overview and financial performance.
- risk_factors: A list of the most significant risk factors (at most 5).
- segment_performance: A list of objects, one per reportable segment, with the keys "Segment", "Revenue" and "Operating Income" (numeric values).
- insights: A list of 3 key insights.
- opportunities: A list of 2 key opportunities.
- risks: A list of 2 key risks.
- takeaways: A list of 3 key takeaways.
- historical_financials: A list of objects, each representing one year. Each object must have the keys "Year", "Total Revenue", "Net Income", "Total Assets", "Total Liabilities", "Equity" and "Cash Flow". The values must be numeric.

## RULES
- All monetary values are plain numbers in US dollars (no currency symbols, no thousands separators, no "millions" shorthand).
- Use null for anything the document does not state.
- Return a single JSON object, not a list.
"#;

pub const CURRENT_REPORT_INSTRUCTIONS: &str = r#"
You are a financial analyst. Analyze the following current report (8-K) and produce structured output in JSON format.
The document contains the full text of an 8-K report, which reports major corporate events.

## ANALYSIS
- **Event Description:** A detailed summary of the event reported, based on the relevant "Item" sections.
- **Impact:** Based on the event and its potential financial or operational consequences, assess its impact with exactly one of: "Very Positive", "Positive", "Neutral", "Negative", "Very Negative".
- **Insights:** 3 key insights derived from the event and its context within the report.
- **Opportunities:** 2 potential opportunities for the company resulting from this event.
- **Risks:** 2 potential risks or challenges associated with this event.
- **Takeaways:** The top 3 most important takeaways for an investor.

## FIELDS
- company_name: The exact company name.
- cik: The CIK number.
- filing_date: The filing date in YYYY-MM-DD format.
- event_description: A detailed description of the event.
- impact: One label from the list above (e.g. "Positive").
- insights: A list of 3 strings.
- opportunities: A list of 2 strings.
- risks: A list of 2 strings.
- takeaways: A list of 3 strings.

## RULES
- Use null for anything the document does not state.
- Return a single JSON object, not a list.
"#;

pub fn instructions_for(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Annual => ANNUAL_REPORT_INSTRUCTIONS,
        ReportKind::Current => CURRENT_REPORT_INSTRUCTIONS,
    }
}

/// Builds the full extraction prompt: instructions, the JSON schema of the
/// target record, then the document text verbatim at the end.
pub fn build_prompt(kind: ReportKind, document_text: &str) -> String {
    let mut prompt = String::from(instructions_for(kind));

    match schema_as_json(kind) {
        Ok(schema) => {
            prompt.push_str("\n## OUTPUT SCHEMA\n");
            prompt.push_str(&schema);
            prompt.push('\n');
        }
        Err(e) => warn!("Could not serialize {} schema: {}", kind, e),
    }

    prompt.push_str("\nReport text:\n");
    prompt.push_str(document_text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_prompt_layout() {
        let prompt = build_prompt(ReportKind::Annual, "APPLE INC. FORM 10-K ...");
        assert!(prompt.contains("annual report (10-K)"));
        assert!(prompt.contains("historical_financials"));
        assert!(prompt.contains("YYYY-MM-DD"));
        assert!(prompt.contains("\"Cash Flow\""));
        assert!(prompt.ends_with("Report text:\nAPPLE INC. FORM 10-K ..."));
    }

    #[test]
    fn test_current_prompt_layout() {
        let prompt = build_prompt(ReportKind::Current, "Item 5.02 Departure of Directors");
        assert!(prompt.contains("current report (8-K)"));
        assert!(prompt.contains("\"Very Negative\""));
        assert!(!prompt.contains("historical_financials"));
        assert!(prompt.ends_with("Item 5.02 Departure of Directors"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt(ReportKind::Current, "same text");
        let b = build_prompt(ReportKind::Current, "same text");
        assert_eq!(a, b);
    }
}
