use crate::charts::{generate_financial_charts, ChartArtifacts};
use crate::error::Result;
use crate::export::{report_filename, save_pdf, PdfRenderer};
use crate::llm::{build_prompt, parse_report_or_default, ContentGenerator};
use crate::loader::{ensure_sufficient_text, load_document_text};
use crate::render::ReportRenderer;
use crate::schema::{AnnualReport, EightKReport, FilingReport, ReportKind};
use crate::utils::sanitize_company;
use chrono::Local;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GenerationEvent {
    Started { file: String, kind: ReportKind },
    ExtractingText,
    RequestingAnalysis,
    DrawingCharts,
    ExportingPdf,
    Completed { pdf_path: Option<PathBuf> },
    Failed { reason: String },
}

impl GenerationEvent {
    /// One-line status for whatever front end is listening.
    pub fn status_text(&self) -> String {
        match self {
            Self::Started { file, kind } => format!("Selected: {} ({})", file, kind),
            Self::ExtractingText => "Processing... Please wait.".to_string(),
            Self::RequestingAnalysis => "Analyzing filing with AI...".to_string(),
            Self::DrawingCharts => "Drawing charts...".to_string(),
            Self::ExportingPdf => "Exporting PDF...".to_string(),
            Self::Completed { .. } => "✅ Report generated successfully!".to_string(),
            Self::Failed { .. } => "❌ Error occurred".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub report: FilingReport,
    /// `None` when the PDF could not be written.
    pub pdf_path: Option<PathBuf>,
    pub charts: ChartArtifacts,
}

/// Runs one filing through extraction, validation, charting, rendering and
/// export.
///
/// Only three failures escape: too little text in the document, a failed
/// AI request, and a broken template. Everything after the AI call degrades
/// instead: bad JSON becomes an empty record, a chart or PDF that cannot be
/// written is logged and skipped.
pub struct ReportSummarizer<G, R> {
    generator: G,
    pdf: R,
    renderer: ReportRenderer,
    output_dir: PathBuf,
}

impl<G: ContentGenerator, R: PdfRenderer> ReportSummarizer<G, R> {
    /// `output_dir` is resolved against the working directory here, so
    /// chart images can be linked by absolute URL.
    pub fn new(generator: G, pdf: R, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            generator,
            pdf,
            renderer: ReportRenderer::new()?,
            output_dir: std::path::absolute(output_dir.into())?,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn summarize_file(
        &self,
        kind: ReportKind,
        path: &Path,
        progress: Option<Sender<GenerationEvent>>,
    ) -> Result<GeneratedReport> {
        send_event(&progress, GenerationEvent::ExtractingText).await;

        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || load_document_text(&owned))
            .await
            .unwrap_or_default();
        info!(
            "Loaded {} characters from {}",
            text.chars().count(),
            path.display()
        );

        self.summarize_text(kind, &text, progress).await
    }

    pub async fn summarize_text(
        &self,
        kind: ReportKind,
        text: &str,
        progress: Option<Sender<GenerationEvent>>,
    ) -> Result<GeneratedReport> {
        let text = ensure_sufficient_text(text)?;

        send_event(&progress, GenerationEvent::RequestingAnalysis).await;
        let prompt = build_prompt(kind, text);
        let raw = self.generator.generate_json(&prompt).await?;

        let report = match kind {
            ReportKind::Annual => FilingReport::Annual(parse_report_or_default::<AnnualReport>(&raw)),
            ReportKind::Current => FilingReport::Current(parse_report_or_default::<EightKReport>(&raw)),
        };

        let company = sanitize_company(report.company_name());
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        let charts = match &report {
            FilingReport::Annual(annual) if !annual.historical_rows().is_empty() => {
                send_event(&progress, GenerationEvent::DrawingCharts).await;
                generate_financial_charts(
                    annual.historical_rows(),
                    &company,
                    &self.output_dir,
                    &timestamp,
                )
            }
            _ => ChartArtifacts::default(),
        };

        let html = self.renderer.render(&report, &charts)?;

        send_event(&progress, GenerationEvent::ExportingPdf).await;
        let filename = report_filename(kind, &company, report.year(), &timestamp);
        let pdf_path = save_pdf(&self.pdf, &html, &self.output_dir, &filename);

        Ok(GeneratedReport {
            report,
            pdf_path,
            charts,
        })
    }
}

pub(crate) async fn send_event(sender: &Option<Sender<GenerationEvent>>, event: GenerationEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event).await;
    }
}
