pub mod completion;
pub mod format;
pub mod parse;
pub mod pdf;
pub mod pipeline;
pub mod prompt;
pub mod types;
pub mod upload;

pub use completion::{
    CompletionBackend, CompletionError, CompletionRequest, MockCompletion, OpenAiBackend,
    OpenAiConfig,
};
pub use format::{format_receipt, repair};
pub use parse::{extract_json_span, parse_reply, ParseError};
pub use pdf::{extract_text, PdfError};
pub use pipeline::{PipelineError, ReceiptPipeline, ScanResult};
pub use prompt::build_prompt;
pub use types::{RawReceipt, ReceiptRecord, ScanStage};
pub use upload::{ReceiptKind, StagedUpload, UploadError, MAX_UPLOAD_BYTES};
