//! Streaming access to the uploaded video file

use std::path::Path;

use reqwest::multipart::Part;
use reqwest::Body;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use crate::error::PlatformError;

/// Opened video file plus the metadata adapters need to describe it
pub struct VideoSource {
    file: File,
    pub len: u64,
    pub file_name: String,
    pub content_type: &'static str,
}

impl VideoSource {
    pub async fn open(path: &Path) -> Result<Self, PlatformError> {
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        if len == 0 {
            return Err(PlatformError::upload(None, "video file is empty"));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4")
            .to_string();

        Ok(Self {
            file,
            len,
            file_name,
            content_type: content_type_for(path),
        })
    }

    /// Whole file as a streaming request body
    pub fn into_body(self) -> Body {
        Body::wrap_stream(ReaderStream::new(self.file))
    }

    /// Whole file as a streaming multipart part
    pub fn into_part(self) -> Result<Part, PlatformError> {
        let file_name = self.file_name.clone();
        let content_type = self.content_type;
        let len = self.len;
        Part::stream_with_length(self.into_body(), len)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(PlatformError::from)
    }

    /// Read the next chunk of at most `max` bytes; an empty vector means end of file
    pub async fn read_chunk(&mut self, max: usize) -> Result<Vec<u8>, PlatformError> {
        let mut chunk = Vec::with_capacity(max);
        let mut limited = (&mut self.file).take(max as u64);
        limited.read_to_end(&mut chunk).await?;
        Ok(chunk)
    }
}

/// Content type guessed from the file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("m4v") => "video/x-m4v",
        _ => "video/mp4",
    }
}
