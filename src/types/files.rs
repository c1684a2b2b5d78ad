use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Largest upload the server accepts, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Body of `POST /api/files/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Name the file was stored under.
    pub filename: String,
    /// Size in bytes, when the server reports it.
    #[serde(default)]
    pub size: Option<u64>,
    /// Media type the upload was sent with.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Server-side path of the stored file.
    #[serde(default)]
    pub file_path: Option<String>,
}

/// One entry of `GET /api/files/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
    /// Creation time in seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: Option<f64>,
}

impl StoredFile {
    /// The creation time, if the server sent a representable one.
    pub fn created(&self) -> Option<OffsetDateTime> {
        let seconds = self.created_at?;
        if !seconds.is_finite() {
            return None;
        }
        OffsetDateTime::from_unix_timestamp_nanos((seconds * 1e9) as i128).ok()
    }
}

/// Body of `GET /api/files/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<StoredFile>,
}
