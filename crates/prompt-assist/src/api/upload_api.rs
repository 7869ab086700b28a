use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    response::Response,
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use super::{track, ApiError};
use crate::error::AssistError;
use crate::shared_state::UnifiedAppState;

const FILE_FIELD: &str = "file";

/// Accepts a multipart form with a `file` field holding the CSV.
pub async fn upload_file(
    State(state): State<UnifiedAppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result = async {
        let mut multipart = multipart.map_err(|e| {
            debug!("Upload without multipart body: {}", e);
            ApiError::bad_request("No file uploaded")
        })?;

        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Upload error: {}", e.body_text())))?
        {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Upload error: {}", e.body_text())))?;
            upload = Some((filename, bytes));
            break;
        }

        let (filename, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
        let receipt = state.uploads.store(&filename, &bytes)?;
        info!("Upload accepted: {} -> {}", receipt.original_name, receipt.filename);

        Ok::<_, ApiError>(Json(json!({
            "success": true,
            "message": format!("File uploaded successfully: {}", receipt.original_name),
            "filename": receipt.filename,
            "rows": receipt.rows,
            "columns": receipt.columns,
        })))
    }
    .await;
    track("upload", result)
}

pub async fn list_files(State(state): State<UnifiedAppState>) -> Response {
    track("files", Ok::<_, ApiError>(Json(state.uploads.list())))
}

/// Full contents of an uploaded file, re-serialized as CSV.
pub async fn get_file(
    State(state): State<UnifiedAppState>,
    Path(filename): Path<String>,
) -> Response {
    let result = (|| {
        let table = state.uploads.read_table(&filename)?;
        let data = table.to_csv_string().map_err(|reason| {
            AssistError::io(
                "Error reading file",
                std::io::Error::new(std::io::ErrorKind::InvalidData, reason),
            )
        })?;
        Ok::<_, ApiError>(Json(json!({
            "success": true,
            "data": data,
            "columns": table.columns,
            "rows": table.row_count(),
        })))
    })();
    track("file", result)
}
