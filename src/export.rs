use crate::error::{Result, SummarizerError};
use crate::schema::ReportKind;
use crate::utils::UNKNOWN_YEAR;
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Converts rendered HTML into a PDF file.
pub trait PdfRenderer: Send + Sync {
    fn render_pdf(&self, html: &str, output: &Path) -> Result<()>;
}

/// Renders through the `wkhtmltopdf` executable. HTML is piped over stdin;
/// local file access is enabled so chart images referenced by `file://`
/// URLs are embedded.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    binary: PathBuf,
}

impl WkHtmlToPdf {
    pub fn new() -> Self {
        Self::with_binary("wkhtmltopdf")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for WkHtmlToPdf {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer for WkHtmlToPdf {
    fn render_pdf(&self, html: &str, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "utf-8", "--enable-local-file-access", "-"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SummarizerError::Render(format!(
                    "could not start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        // A renderer that dies early breaks the pipe; its exit status and
        // stderr say why, so they take precedence over the write error.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(html.as_bytes()),
            None => Ok(()),
        };

        let out = child.wait_with_output()?;
        match out.status.code() {
            Some(0) => written.map_err(|e| {
                SummarizerError::Render(format!(
                    "could not stream HTML to {}: {}",
                    self.binary.display(),
                    e
                ))
            }),
            Some(code) => Err(SummarizerError::Render(format!(
                "{} exited with code {}: {}",
                self.binary.display(),
                code,
                String::from_utf8_lossy(&out.stderr).trim()
            ))),
            None => Err(SummarizerError::Render(format!(
                "{} was terminated",
                self.binary.display()
            ))),
        }
    }
}

/// `annual_report_Apple_Inc._2023_20240101_120000.pdf`
pub fn report_filename(kind: ReportKind, company: &str, year: Option<i32>, timestamp: &str) -> String {
    let year = year
        .map(|y| y.to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string());
    format!("{}_{}_{}_{}.pdf", kind.file_prefix(), company, year, timestamp)
}

/// Writes the PDF into `output_dir`. Failures are logged and reported as
/// `None` so the caller still gets its validated record.
pub fn save_pdf(
    renderer: &dyn PdfRenderer,
    html: &str,
    output_dir: &Path,
    filename: &str,
) -> Option<PathBuf> {
    let path = output_dir.join(filename);
    let result = std::fs::create_dir_all(output_dir)
        .map_err(SummarizerError::from)
        .and_then(|_| renderer.render_pdf(html, &path));

    match result {
        Ok(()) => {
            info!("Saved PDF to {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!("Could not save PDF to {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HtmlDump;

    impl PdfRenderer for HtmlDump {
        fn render_pdf(&self, html: &str, output: &Path) -> Result<()> {
            std::fs::write(output, html)?;
            Ok(())
        }
    }

    struct Broken;

    impl PdfRenderer for Broken {
        fn render_pdf(&self, _html: &str, _output: &Path) -> Result<()> {
            Err(SummarizerError::Render("no renderer".to_string()))
        }
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(
            report_filename(ReportKind::Annual, "Apple_Inc.", Some(2023), "20240101_120000"),
            "annual_report_Apple_Inc._2023_20240101_120000.pdf"
        );
        assert_eq!(
            report_filename(ReportKind::Current, "unknown_company", None, "20240101_120000"),
            "8k_report_unknown_company_unknown_year_20240101_120000.pdf"
        );
    }

    #[test]
    fn test_save_pdf_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Desktop");
        let path = save_pdf(&HtmlDump, "<html></html>", &nested, "report.pdf").unwrap();
        assert_eq!(path, nested.join("report.pdf"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_save_pdf_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_pdf(&Broken, "<html></html>", dir.path(), "report.pdf").is_none());
        assert!(!dir.path().join("report.pdf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_early_exit_reports_status_before_pipe_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("x.pdf");
        // Larger than a pipe buffer, so the write fails once the child is gone.
        let html = "<p>filler</p>".repeat(100_000);

        let err = WkHtmlToPdf::with_binary("false")
            .render_pdf(&html, &output)
            .unwrap_err();
        assert!(err.to_string().contains("exited with code 1"), "{}", err);

        let err = WkHtmlToPdf::with_binary("true")
            .render_pdf(&html, &output)
            .unwrap_err();
        assert!(matches!(err, SummarizerError::Render(_)));
        assert!(err.to_string().contains("could not stream HTML"), "{}", err);
    }

    #[test]
    fn test_missing_binary_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = WkHtmlToPdf::with_binary("/nonexistent/wkhtmltopdf");
        let err = renderer
            .render_pdf("<html></html>", &dir.path().join("x.pdf"))
            .unwrap_err();
        assert!(matches!(err, SummarizerError::Render(_)));
    }
}
