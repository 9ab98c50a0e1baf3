use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::completion::{CompletionBackend, CompletionError, CompletionRequest};
use crate::format;
use crate::parse::{self, ParseError};
use crate::pdf::{self, PdfError};
use crate::prompt;
use crate::types::{ReceiptRecord, ScanStage};
use crate::upload::{self, ReceiptKind, StagedUpload, UploadError, DEFAULT_VIRTUAL_PREFIX};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF text extraction failed: {0}")]
    Pdf(#[from] PdfError),
    #[error("AI completion failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("Invalid receipt data: {0}")]
    InvalidReceipt(#[from] ParseError),
    #[error("Text extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The result of a single receipt scan.
#[derive(Debug)]
pub struct ScanResult {
    pub record: ReceiptRecord,
    /// Logical path of the stored upload, also set as `record.receipt_url`.
    pub virtual_path: String,
    /// Staged copy on disk. Not removed by the pipeline.
    pub temp_path: PathBuf,
}

/// Orchestrates: validate → stage → (PDF text | base64 image) → prompt →
/// completion → parse → repair → format.
pub struct ReceiptPipeline<B: CompletionBackend> {
    backend: B,
    upload_dir: PathBuf,
    virtual_prefix: String,
}

impl<B: CompletionBackend> ReceiptPipeline<B> {
    pub fn new(backend: B, upload_dir: PathBuf) -> Self {
        Self {
            backend,
            upload_dir,
            virtual_prefix: DEFAULT_VIRTUAL_PREFIX.to_string(),
        }
    }

    pub fn with_virtual_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.virtual_prefix = prefix.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Process a file on disk; the type comes from its extension.
    pub async fn process_file(
        &self,
        path: &Path,
        categories: &[String],
    ) -> Result<ScanResult, PipelineError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mime = ReceiptKind::from_extension(ext)
            .map(ReceiptKind::mime)
            .ok_or_else(|| UploadError::UnsupportedType(format!(".{ext}")))?;
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes, mime, categories).await
    }

    /// Process raw upload bytes with their declared MIME type.
    pub async fn process_bytes(
        &self,
        data: &[u8],
        mime: &str,
        categories: &[String],
    ) -> Result<ScanResult, PipelineError> {
        // 1. Reject bad input before any I/O.
        let kind = upload::validate(mime, data.len())?;

        // 2. Stage the upload.
        let staged = upload::stage(&self.upload_dir, &self.virtual_prefix, data, kind).await?;
        tracing::debug!(
            stage = %ScanStage::Uploaded,
            path = %staged.temp_path.display(),
            bytes = data.len(),
            "Receipt staged"
        );

        let result = self.extract(data, &staged, categories).await;
        if let Err(e) = &result {
            tracing::warn!(stage = %ScanStage::Failed, virtual_path = %staged.virtual_path, "Receipt extraction failed: {e}");
        }
        result
    }

    async fn extract(
        &self,
        data: &[u8],
        staged: &StagedUpload,
        categories: &[String],
    ) -> Result<ScanResult, PipelineError> {
        // 3-4. Build the completion request for this file type.
        let request = if staged.kind.is_image() {
            let image_data_url = format!("data:{};base64,{}", staged.kind.mime(), STANDARD.encode(data));
            let system = prompt::build_prompt(categories, None);
            tracing::debug!(stage = %ScanStage::PromptBuilt, "Vision prompt built");
            CompletionRequest::Vision {
                system,
                image_data_url,
            }
        } else {
            let bytes = data.to_vec();
            let text = tokio::task::spawn_blocking(move || pdf::extract_text(&bytes)).await??;
            tracing::debug!(stage = %ScanStage::TextExtracted, chars = text.len(), "PDF text extracted");
            let prompt = prompt::build_prompt(categories, Some(&text));
            tracing::debug!(stage = %ScanStage::PromptBuilt, "Text prompt built");
            CompletionRequest::Text { prompt }
        };

        // 5. One call, no retry.
        let reply = self.backend.complete(request).await?;
        tracing::debug!(stage = %ScanStage::ModelInvoked, reply_chars = reply.len(), "Model replied");

        // 6. Parse the first JSON object out of the reply.
        let raw = parse::parse_reply(&reply)?;
        tracing::debug!(stage = %ScanStage::ResponseParsed, "Reply parsed");

        // 7-8. Repair and format.
        let record = format::format_receipt(format::repair(raw), Some(staged.virtual_path.clone()));
        tracing::debug!(stage = %ScanStage::Formatted, title = %record.title, amount = record.amount, "Receipt formatted");

        tracing::info!(stage = %ScanStage::Done, virtual_path = %staged.virtual_path, "Receipt extracted");
        Ok(ScanResult {
            record,
            virtual_path: staged.virtual_path.clone(),
            temp_path: staged.temp_path.clone(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
