use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted receipt file (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_VIRTUAL_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type: '{0}'")]
    UnsupportedType(String),
    #[error("File is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("File is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    Jpeg,
    Png,
    Webp,
    Pdf,
}

impl ReceiptKind {
    /// Parameters such as `; charset=binary` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(ReceiptKind::Jpeg),
            "image/png" => Some(ReceiptKind::Png),
            "image/webp" => Some(ReceiptKind::Webp),
            "application/pdf" => Some(ReceiptKind::Pdf),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ReceiptKind::Jpeg),
            "png" => Some(ReceiptKind::Png),
            "webp" => Some(ReceiptKind::Webp),
            "pdf" => Some(ReceiptKind::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ReceiptKind::Jpeg => "image/jpeg",
            ReceiptKind::Png => "image/png",
            ReceiptKind::Webp => "image/webp",
            ReceiptKind::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReceiptKind::Jpeg => "jpg",
            ReceiptKind::Png => "png",
            ReceiptKind::Webp => "webp",
            ReceiptKind::Pdf => "pdf",
        }
    }

    pub fn is_image(self) -> bool {
        !matches!(self, ReceiptKind::Pdf)
    }
}

/// Check type and size. Runs before anything touches the disk.
pub fn validate(mime: &str, size: usize) -> Result<ReceiptKind, UploadError> {
    let kind = ReceiptKind::from_mime(mime)
        .ok_or_else(|| UploadError::UnsupportedType(mime.to_string()))?;
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(kind)
}

/// A receipt written to the staging directory.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub kind: ReceiptKind,
    /// Where the bytes actually live while processing.
    pub temp_path: PathBuf,
    /// Logical reference handed back to the client, e.g. `/uploads/<name>`.
    pub virtual_path: String,
}

/// Write `data` under a fresh random name. The file is left in place;
/// its lifetime is managed outside the pipeline.
pub async fn stage(
    upload_dir: &Path,
    virtual_prefix: &str,
    data: &[u8],
    kind: ReceiptKind,
) -> std::io::Result<StagedUpload> {
    let file_name = format!("{}.{}", uuid::Uuid::new_v4(), kind.extension());
    let temp_path = upload_dir.join(&file_name);
    let virtual_path = virtual_path_for(virtual_prefix, &file_name);

    tokio::fs::create_dir_all(upload_dir).await?;
    tokio::fs::write(&temp_path, data).await?;

    Ok(StagedUpload {
        kind,
        temp_path,
        virtual_path,
    })
}

fn virtual_path_for(prefix: &str, file_name: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), file_name)
}
