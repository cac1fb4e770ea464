//! Submission payloads and result artifacts.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::types::{JobId, ToolKind};

/// User input for one job: the uploaded file plus tool-specific parameters.
#[derive(Debug, Clone)]
pub struct JobPayload {
    pub tool: ToolKind,
    pub file_name: String,
    /// MIME type of the upload, e.g. `image/png`.
    pub content_type: String,
    pub data: Bytes,
    /// Tool-specific form fields (scale factor, style, ...).
    pub params: BTreeMap<String, String>,
}

impl JobPayload {
    pub fn new(
        tool: ToolKind,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            tool,
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// A payload is submittable when it carries file bytes. Size and
    /// format are the orchestrator's business.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The binary output of a successful job.
///
/// Shared behind an `Arc` by the lifecycle state; the reference is
/// released as soon as the session is superseded or reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub job_id: JobId,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File extension suggested by the content type, if recognised.
    pub fn extension(&self) -> Option<&'static str> {
        match self.content_type.as_deref()? {
            "image/png" => Some("png"),
            "image/jpeg" => Some("jpg"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }
}

/// Guess an image MIME type from a file name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_data_is_empty_payload() {
        let payload = JobPayload::new(ToolKind::Sketch, "a.png", "image/png", Vec::new());
        assert!(payload.is_empty());
    }

    #[test]
    fn params_accumulate() {
        let payload = JobPayload::new(ToolKind::SuperResolution, "a.png", "image/png", vec![1])
            .with_param("scale", "4")
            .with_param("face_enhance", "true");
        assert_eq!(payload.params.get("scale").map(String::as_str), Some("4"));
        assert_eq!(payload.params.len(), 2);
    }

    #[test]
    fn content_type_guess() {
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("scan.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn artifact_extension_from_content_type() {
        let artifact = Artifact {
            job_id: JobId::new("j"),
            content_type: Some("image/png".into()),
            data: Bytes::from_static(b"png"),
        };
        assert_eq!(artifact.extension(), Some("png"));
        assert_eq!(artifact.len(), 3);
    }
}
