use bytes::Bytes;
use thiserror::Error;

pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/png", "image/jpg", "image/jpeg"];

#[derive(Debug, Clone)]
pub struct UploadArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadArtifact {
    /// Builds an artifact from a multipart part. When the part carries no content
    /// type the type is guessed from the file name.
    pub fn from_part(file_name: Option<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        let file_name = file_name.unwrap_or_default();
        let mime_type = content_type
            .map(|value| normalize_mime(&value))
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("A file is required")]
    MissingFile,
    #[error("Unsupported file format '{0}'. Allowed formats: pdf, png, jpg, jpeg")]
    UnsupportedFormat(String),
    #[error("File is too large ({size} bytes). Maximum allowed size is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },
}

fn normalize_mime(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_allowed_mime(mime: &str) -> bool {
    let normalized = normalize_mime(mime);
    ALLOWED_MIME_TYPES.iter().any(|allowed| *allowed == normalized)
}

/// Checks presence, then format, then size; the first failure wins.
pub fn validate(artifact: Option<&UploadArtifact>, max_bytes: usize) -> Result<(), UploadRejection> {
    let artifact = match artifact {
        Some(artifact) if !artifact.bytes.is_empty() => artifact,
        _ => return Err(UploadRejection::MissingFile),
    };

    if !is_allowed_mime(&artifact.mime_type) {
        return Err(UploadRejection::UnsupportedFormat(
            artifact.mime_type.clone(),
        ));
    }

    if artifact.size_bytes() > max_bytes {
        return Err(UploadRejection::FileTooLarge {
            size: artifact.size_bytes(),
            limit: max_bytes,
        });
    }

    Ok(())
}

/// Validates and hands back the artifact that passed every check.
pub fn require_valid(
    artifact: Option<UploadArtifact>,
    max_bytes: usize,
) -> Result<UploadArtifact, UploadRejection> {
    validate(artifact.as_ref(), max_bytes)?;
    artifact.ok_or(UploadRejection::MissingFile)
}
