//! Content capabilities the orchestrator invokes after actions are selected.
//!
//! Both capabilities are injected, so the service never depends on a specific
//! text-generation vendor or document format. Their failures are reported as
//! values and degraded to placeholders by the caller.

mod forms;
mod http;
pub mod prompts;

pub use forms::HtmlFormRenderer;
pub use http::HttpTextGenerator;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use super::selector::AidFormRequest;

/// External text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    NotConfigured,
    #[error("text generation timed out after {0} seconds")]
    Timeout(u64),
    #[error("text generation transport failed: {0}")]
    Transport(String),
    #[error("text generation service returned status {0}")]
    Status(u16),
    #[error("text generation response was malformed: {0}")]
    MalformedResponse(String),
}

/// Stand-in used when no generation credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTextGenerator;

#[async_trait]
impl TextGenerator for DisabledTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Document-rendering capability for aid applications.
pub trait FormRenderer: Send + Sync {
    fn render(&self, form: &AidFormRequest) -> Result<RenderedForm, RenderError>;
}

/// Location and media type of a rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedForm {
    pub path: PathBuf,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unable to write form {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
