//! Resume upload policy: size, declared extension, and the file's actual
//! leading bytes must all agree before anything is persisted. Pure functions,
//! no I/O.

use serde::Serialize;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

const PDF_SIGNATURE: &[u8] = b"%PDF";
// DOCX is a ZIP container.
const DOCX_SIGNATURE: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResumeKind {
    Pdf,
    Docx,
}

impl ResumeKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ResumeKind::Pdf => "application/pdf",
            ResumeKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResumeKind::Pdf),
            "docx" => Some(ResumeKind::Docx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("file exceeds the maximum size of {max_bytes} bytes (got {actual_bytes})")]
    TooLarge {
        actual_bytes: usize,
        max_bytes: usize,
    },

    #[error("only PDF and DOCX resumes are accepted")]
    BadExtension,

    #[error("file content does not match the declared type")]
    ContentMismatch,
}

/// Validate an uploaded resume against policy. A spoofed extension fails the
/// signature check even though the extension check alone would pass.
pub fn validate(
    bytes: &[u8],
    declared_filename: &str,
    max_size_bytes: usize,
) -> Result<ResumeKind, RejectReason> {
    if bytes.len() > max_size_bytes {
        return Err(RejectReason::TooLarge {
            actual_bytes: bytes.len(),
            max_bytes: max_size_bytes,
        });
    }

    let ext = declared_filename
        .rsplit_once('.')
        .map(|(_, e)| e)
        .unwrap_or("");
    let kind = ResumeKind::from_extension(ext).ok_or(RejectReason::BadExtension)?;

    let signature_matches = match kind {
        ResumeKind::Pdf => bytes.starts_with(PDF_SIGNATURE),
        ResumeKind::Docx => bytes.starts_with(DOCX_SIGNATURE),
    };
    if !signature_matches {
        return Err(RejectReason::ContentMismatch);
    }

    Ok(kind)
}
