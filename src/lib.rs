//! # Filing Summarizer
//!
//! Turns SEC filings into PDF dashboards.
//!
//! A 10-K or 8-K PDF is reduced to plain text, sent to Gemini with an
//! extraction prompt, and the JSON that comes back is validated into an
//! [`AnnualReport`] or [`EightKReport`]. The record is rendered into an HTML
//! page (with revenue and year-over-year charts for annual reports) and
//! exported as a PDF.
//!
//! Extraction is fail-open: malformed or mismatched model output produces an
//! empty record and an "N/A" report instead of an error.
//!
//! ## Example
//!
//! ```rust,ignore
//! use filing_summarizer::*;
//!
//! let config = SummarizerConfig::from_env()?;
//! let client = GeminiClient::new(config.api_key.clone()).with_model(&config.model);
//! let summarizer = ReportSummarizer::new(client, WkHtmlToPdf::new(), &config.output_dir)?;
//!
//! let generated = summarizer
//!     .summarize_file(ReportKind::Annual, "aapl-10k.pdf".as_ref(), None)
//!     .await?;
//! println!("{:?}", generated.pdf_path);
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod utils;
pub mod worker;

pub use charts::{generate_financial_charts, ChartArtifacts, FinancialTable, ValueScale};
pub use config::SummarizerConfig;
pub use error::{Result, SummarizerError};
pub use export::{report_filename, save_pdf, PdfRenderer, WkHtmlToPdf};
#[cfg(feature = "gemini")]
pub use llm::GeminiClient;
pub use llm::{build_prompt, parse_report, parse_report_or_default, ContentGenerator};
pub use loader::{ensure_pdf_path, ensure_sufficient_text, load_document_text, MIN_TEXT_CHARS};
pub use pipeline::{GeneratedReport, GenerationEvent, ReportSummarizer};
pub use render::ReportRenderer;
pub use schema::*;
pub use utils::*;
pub use worker::GenerationWorker;
