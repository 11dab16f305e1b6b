use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("The selected PDF is empty or does not contain enough text for analysis ({chars} characters)")]
    InsufficientText { chars: usize },

    #[error("Unsupported input file {0}: only PDF files are accepted")]
    UnsupportedFile(String),

    #[error("AI service request failed: {0}")]
    Network(String),

    #[error("AI response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Unexpected JSON format from AI response: {0}")]
    Format(String),

    #[error("AI response does not match the report schema: {0}")]
    Validation(#[source] serde_json::Error),

    #[error("Chart generation failed: {0}")]
    Chart(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A report is already being generated")]
    Busy,

    #[error("Generation task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "gemini")]
impl From<reqwest::Error> for SummarizerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SummarizerError>;
