use clap::Parser;
use dotenv::dotenv;
use filing_summarizer::{
    ensure_pdf_path, GeminiClient, GenerationWorker, ReportKind, ReportSummarizer,
    SummarizerConfig, SummarizerError, WkHtmlToPdf,
};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;

/// Summarize an SEC 10-K or 8-K filing into a PDF dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PDF file of the filing
    file: PathBuf,

    /// Report type: 10-K (annual) or 8-K (current)
    #[arg(short, long, default_value = "10-K")]
    kind: ReportKind,

    /// Directory for the PDF and chart images (defaults to the desktop)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Gemini model identifier
    #[arg(long)]
    model: Option<String>,

    /// Path to the wkhtmltopdf executable
    #[arg(long, default_value = "wkhtmltopdf")]
    wkhtmltopdf: PathBuf,

    /// Print the validated record as JSON once done
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), SummarizerError> {
    ensure_pdf_path(&args.file)?;

    let mut config = SummarizerConfig::from_env()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(dir) = args.output_dir {
        config = config.with_output_dir(dir);
    }

    let client = GeminiClient::new(config.api_key.clone()).with_model(config.model.clone());
    let summarizer = ReportSummarizer::new(
        client,
        WkHtmlToPdf::with_binary(args.wkhtmltopdf),
        config.output_dir.clone(),
    )?;
    let worker = GenerationWorker::new(summarizer);

    let (tx, mut rx) = mpsc::channel(16);
    let handle = worker.submit(args.kind, args.file, Some(tx))?;

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", event.status_text());
        }
    });

    let generated = handle
        .await
        .map_err(|e| SummarizerError::TaskFailed(e.to_string()))??;
    let _ = printer.await;

    match &generated.pdf_path {
        Some(path) => println!("Report has been generated and saved to {}", path.display()),
        None => warn!(
            "The report was generated but the PDF could not be written to {}",
            config.output_dir.display()
        ),
    }

    if args.json {
        match serde_json::to_string_pretty(&generated.report) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Could not serialize the report: {}", e),
        }
    }

    Ok(())
}
