use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tally_receipt::{ReceiptKind, ReceiptRecord};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the receipt.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub receipt: ReceiptRecord,
    pub file_path: String,
}

/// Runs the extraction pipeline on an uploaded receipt. Nothing is saved as
/// an expense; the client confirms the prefilled form first.
pub async fn scan(
    State(state): State<AppState>,
    UserId(user): UserId,
    mut multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let mime = field_mime(field.content_type(), field.file_name());
        let data = field.bytes().await?;
        tracing::info!(user = %user, mime = %mime, bytes = data.len(), "Receipt upload received");

        let categories = state.store.category_names(&user).await?;
        let result = state.pipeline.process_bytes(&data, &mime, &categories).await?;
        return Ok(Json(ScanResponse {
            receipt: result.record,
            file_path: result.virtual_path,
        }));
    }
    Err(ApiError::BadRequest(format!(
        "Multipart field '{FILE_FIELD}' is missing"
    )))
}

/// Declared content type, else one guessed from the file name. Browsers send
/// `application/octet-stream` for types they don't recognise.
fn field_mime(content_type: Option<&str>, file_name: Option<&str>) -> String {
    let declared = content_type.filter(|ct| !ct.eq_ignore_ascii_case("application/octet-stream"));
    if let Some(ct) = declared {
        return ct.to_string();
    }
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| ReceiptKind::from_extension(ext))
        .map(|kind| kind.mime().to_string())
        .unwrap_or_else(|| content_type.unwrap_or("application/octet-stream").to_string())
}
