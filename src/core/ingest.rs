use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use tracing::info;

use crate::error::IngestError;

pub const DEFAULT_UPLOAD_CEILING: u64 = 2 * 1024 * 1024;

/// A picked image file. `reported_size` comes from file metadata and is
/// checked before the contents are read.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub reported_size: u64,
    bytes: Option<Vec<u8>>,
    path: Option<std::path::PathBuf>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            reported_size: bytes.len() as u64,
            bytes: Some(bytes),
            path: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let meta = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            reported_size: meta.len(),
            bytes: None,
            path: Some(path.to_path_buf()),
        })
    }

    fn read(&self) -> Result<Vec<u8>, IngestError> {
        match (&self.bytes, &self.path) {
            (Some(bytes), _) => Ok(bytes.clone()),
            (None, Some(path)) => Ok(std::fs::read(path)?),
            (None, None) => Ok(Vec::new()),
        }
    }
}

/// Checks the size ceiling and the file signature, then returns the image as
/// a `data:` URL.
pub fn ingest(upload: &ImageUpload, ceiling: u64) -> Result<String, IngestError> {
    if upload.reported_size > ceiling {
        return Err(IngestError::TooLarge {
            size: upload.reported_size,
            limit: ceiling,
        });
    }
    let bytes = upload.read()?;
    // The file may have grown since its metadata was read.
    if bytes.len() as u64 > ceiling {
        return Err(IngestError::TooLarge {
            size: bytes.len() as u64,
            limit: ceiling,
        });
    }
    let format = image::guess_format(&bytes).map_err(|_| IngestError::NotAnImage {
        file_name: upload.file_name.clone(),
    })?;
    info!(file = %upload.file_name, bytes = bytes.len(), "image ingested");
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64.encode(&bytes)
    ))
}
