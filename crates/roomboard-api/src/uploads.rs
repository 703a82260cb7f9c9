use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use uuid::Uuid;

use roomboard_types::api::UploadResponse;

use crate::error::ApiError;
use crate::state::AppState;

const MAX_EXTENSION_LEN: usize = 16;

/// POST /upload — multipart form with a `file` field. Stored under a fresh
/// UUID name that keeps the uploaded file's extension; served back at `/uploads/`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = match field.file_name().and_then(sanitized_extension) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
            error!("Failed to create uploads directory {}: {}", state.upload_dir.display(), e);
            ApiError::Internal(e.into())
        })?;

        let path = state.upload_dir.join(&file_name);
        let size = match write_field(&path, field).await {
            Ok(size) => size,
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }
        };

        info!("Stored upload {} ({} bytes)", file_name, size);
        return Ok(Json(UploadResponse {
            url: format!("/uploads/{}", file_name),
        }));
    }

    Err(ApiError::BadRequest("Missing 'file' field".into()))
}

/// Stream a multipart field to disk chunk by chunk. Returns bytes written.
async fn write_field(path: &FsPath, mut field: Field<'_>) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(path).await.map_err(|e| {
        error!("Failed to create file {}: {}", path.display(), e);
        ApiError::Internal(e.into())
    })?;

    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await.map_err(|e| {
            error!("Failed to write file {}: {}", path.display(), e);
            ApiError::Internal(e.into())
        })?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| ApiError::Internal(e.into()))?;

    Ok(written)
}

/// The client's extension, if it is short and purely alphanumeric.
/// Anything else is dropped rather than trusted in a path.
fn sanitized_extension(file_name: &str) -> Option<&str> {
    FsPath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_extensions() {
        assert_eq!(sanitized_extension("cat.png"), Some("png"));
        assert_eq!(sanitized_extension("archive.tar.GZ"), Some("GZ"));
    }

    #[test]
    fn drops_suspicious_extensions() {
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension("evil.p$p"), None);
        assert_eq!(sanitized_extension("x.averyveryverylongextension"), None);
        assert_eq!(sanitized_extension(".."), None);
    }
}
