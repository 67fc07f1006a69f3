//! Turning an uploaded file into the preview and payload the analysis needs.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use crate::error::IngestError;

/// A file as received from the browser, before validation.
#[derive(Debug, Clone, Default)]
pub struct ImageBlob {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A validated image. `base64` carries no `data:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub size_bytes: usize,
    pub preview: String,
    #[serde(skip)]
    pub base64: String,
    pub mime_type: String,
}

pub fn ingest(blob: ImageBlob) -> Result<UploadedImage, IngestError> {
    let mime_type = match image_essence(blob.content_type.as_deref()) {
        Some(essence) => essence,
        None => {
            log::warn!(
                "Rejected upload {:?}: content type {:?}",
                blob.file_name,
                blob.content_type
            );
            return Err(IngestError::InvalidInput(
                "Please upload an image file".to_string(),
            ));
        }
    };

    if blob.bytes.is_empty() {
        log::warn!("Rejected upload {:?}: empty body", blob.file_name);
        return Err(IngestError::InvalidInput(
            "The selected image is empty".to_string(),
        ));
    }

    let preview = format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(&blob.bytes)
    );
    let base64 = preview
        .split_once(',')
        .map(|(_, payload)| payload.to_string())
        .ok_or_else(|| IngestError::InvalidInput("Malformed data URL".to_string()))?;

    log::debug!(
        "Ingested {:?} ({}, {} bytes)",
        blob.file_name,
        mime_type,
        blob.bytes.len()
    );

    Ok(UploadedImage {
        file_name: blob.file_name,
        size_bytes: blob.bytes.len(),
        preview,
        base64,
        mime_type,
    })
}

/// `type/subtype` of a declared image content type, parameters stripped.
fn image_essence(content_type: Option<&str>) -> Option<String> {
    let parsed: mime::Mime = content_type?.trim().parse().ok()?;
    if parsed.type_() != mime::IMAGE {
        return None;
    }
    Some(parsed.essence_str().to_string())
}

#[cfg(test)]
pub(crate) fn blob(name: &str, content_type: &str, bytes: &[u8]) -> ImageBlob {
    ImageBlob {
        file_name: Some(name.to_string()),
        content_type: Some(content_type.to_string()),
        bytes: bytes.to_vec(),
    }
}
