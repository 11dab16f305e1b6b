#[cfg(feature = "gemini")]
pub mod client;
pub mod parser;
pub mod prompts;
pub mod types;

#[cfg(feature = "gemini")]
pub use client::*;
pub use parser::*;
pub use prompts::build_prompt;
pub use types::*;
