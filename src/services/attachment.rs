use base64::Engine;
use std::path::Path;

const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' is too large ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: usize, limit: usize },
    #[error("'{0}' is not a file path, URL or base64 data")]
    Unrecognized(String),
}

/// A file ready to hand to the SDK's upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub file_name: String,
    pub data_url: String,
    pub size: usize,
}

/// Turns local files into the data URLs the upload call expects.
pub struct AttachmentService;

impl AttachmentService {
    /// Accepts a file path, an existing `data:` URL, or bare base64.
    pub async fn encode(input: &str) -> Result<EncodedFile, AttachmentError> {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix("data:") {
            let size = rest
                .split_once(',')
                .and_then(|(_, data)| base64::engine::general_purpose::STANDARD.decode(data).ok())
                .map(|bytes| bytes.len())
                .ok_or_else(|| AttachmentError::Unrecognized(trimmed.to_string()))?;
            return Ok(EncodedFile {
                file_name: "inline".to_string(),
                data_url: trimmed.to_string(),
                size,
            });
        }

        let path = Path::new(trimmed);
        if path.exists() {
            let bytes = tokio::fs::read(path).await.map_err(|source| AttachmentError::Read {
                path: trimmed.to_string(),
                source,
            })?;
            if bytes.len() > MAX_ATTACHMENT_BYTES {
                return Err(AttachmentError::TooLarge {
                    path: trimmed.to_string(),
                    size: bytes.len(),
                    limit: MAX_ATTACHMENT_BYTES,
                });
            }
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
            return Ok(EncodedFile {
                data_url: format!("data:{};base64,{}", Self::mime_type(path), b64),
                file_name,
                size: bytes.len(),
            });
        }

        match base64::engine::general_purpose::STANDARD.decode(trimmed) {
            Ok(bytes) => Ok(EncodedFile {
                file_name: "inline".to_string(),
                data_url: format!("data:application/octet-stream;base64,{}", trimmed),
                size: bytes.len(),
            }),
            Err(_) => Err(AttachmentError::Unrecognized(trimmed.to_string())),
        }
    }

    pub fn mime_type(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "txt" | "log" => "text/plain",
            "json" => "application/json",
            "mp3" => "audio/mpeg",
            "mp4" => "video/mp4",
            _ => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encodes_files_with_their_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, b"hello").unwrap();

        let encoded = AttachmentService::encode(path.to_str().unwrap()).await.unwrap();
        assert_eq!(encoded.file_name, "note.txt");
        assert_eq!(encoded.size, 5);
        assert_eq!(encoded.data_url, "data:text/plain;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn passes_data_urls_and_bare_base64_through() {
        let url = AttachmentService::encode("data:text/plain;base64,aGVsbG8=").await.unwrap();
        assert_eq!(url.size, 5);
        let bare = AttachmentService::encode("aGVsbG8=").await.unwrap();
        assert_eq!(bare.data_url, "data:application/octet-stream;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let err = AttachmentService::encode("/definitely/not/here.png!").await.unwrap_err();
        assert!(matches!(err, AttachmentError::Unrecognized(_)));
    }
}
