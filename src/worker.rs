use crate::error::{Result, SummarizerError};
use crate::export::PdfRenderer;
use crate::llm::ContentGenerator;
use crate::pipeline::{send_event, GeneratedReport, GenerationEvent, ReportSummarizer};
use crate::schema::ReportKind;
use log::{error, info};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Single-slot background runner: at most one generation is in flight, and
/// submissions made meanwhile are refused rather than queued.
pub struct GenerationWorker<G, R> {
    summarizer: Arc<ReportSummarizer<G, R>>,
    busy: Arc<AtomicBool>,
}

impl<G, R> GenerationWorker<G, R>
where
    G: ContentGenerator + 'static,
    R: PdfRenderer + 'static,
{
    pub fn new(summarizer: ReportSummarizer<G, R>) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Spawns a generation of the PDF at `path` on the current tokio runtime.
    pub fn submit(
        &self,
        kind: ReportKind,
        path: PathBuf,
        events: Option<Sender<GenerationEvent>>,
    ) -> Result<JoinHandle<Result<GeneratedReport>>> {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.spawn(kind, label, Job::File(path), events)
    }

    /// Like [`submit`](Self::submit) for text that was already extracted.
    /// `label` names the source in events and logs.
    pub fn submit_text(
        &self,
        kind: ReportKind,
        label: impl Into<String>,
        text: String,
        events: Option<Sender<GenerationEvent>>,
    ) -> Result<JoinHandle<Result<GeneratedReport>>> {
        self.spawn(kind, label.into(), Job::Text(text), events)
    }

    fn spawn(
        &self,
        kind: ReportKind,
        label: String,
        job: Job,
        events: Option<Sender<GenerationEvent>>,
    ) -> Result<JoinHandle<Result<GeneratedReport>>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SummarizerError::Busy);
        }

        let slot = SlotGuard(Arc::clone(&self.busy));
        let summarizer = Arc::clone(&self.summarizer);

        Ok(tokio::spawn(async move {
            let _slot = slot;
            send_event(
                &events,
                GenerationEvent::Started {
                    file: label.clone(),
                    kind,
                },
            )
            .await;

            let result = match &job {
                Job::File(path) => summarizer.summarize_file(kind, path, events.clone()).await,
                Job::Text(text) => summarizer.summarize_text(kind, text, events.clone()).await,
            };

            match &result {
                Ok(generated) => {
                    info!("{} report for {} finished", kind, label);
                    send_event(
                        &events,
                        GenerationEvent::Completed {
                            pdf_path: generated.pdf_path.clone(),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    error!("{} report for {} failed: {}", kind, label, e);
                    send_event(
                        &events,
                        GenerationEvent::Failed {
                            reason: e.to_string(),
                        },
                    )
                    .await;
                }
            }
            result
        }))
    }
}

enum Job {
    File(PathBuf),
    Text(String),
}

/// Frees the slot when the task ends, including by panic.
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
