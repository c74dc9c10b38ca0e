use thiserror::Error;

// ── Storage ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded ({needed} bytes needed, {limit} allowed)")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

// ── Image ingestion ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("image is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("'{file_name}' is not a supported image")]
    NotAnImage { file_name: String },
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

impl IngestError {
    /// Text shown to the user when an upload is refused.
    pub fn user_message(&self) -> String {
        match self {
            IngestError::TooLarge { size, limit } => format!(
                "The image is too large ({:.1}MB). Please choose an image smaller than {}MB.",
                megabytes(*size),
                megabytes(*limit).round()
            ),
            IngestError::NotAnImage { .. } => {
                "That file is not an image. Please choose a PNG or JPEG file.".to_string()
            }
            IngestError::Io(_) => "Error processing the image. Please try again.".to_string(),
        }
    }
}

// ── Identity ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity exchange failed: {0}")]
    Exchange(String),
    #[error("identity provider panicked")]
    Panicked,
}
