// crates/client/src/message.rs
//! Query payload construction: text parts and validated image attachments.

use std::path::Path;

use base64::Engine as _;
use serde::Serialize;

use crate::error::Error;

/// Client-side cap on attachment size, checked before base64 expansion.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Body of `POST /api/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub user_id: String,
    pub session_id: String,
    pub message_parts: Vec<MessagePart>,
}

/// One part of the analysis request message: plain text or an inline
/// base64 blob.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessagePart {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }

    /// Read and validate an image file into an inline-data part.
    ///
    /// Validation runs before any network call: the extension must map to
    /// an image MIME type and the file must fit under
    /// [`MAX_ATTACHMENT_BYTES`].
    pub fn attach_image(path: &Path) -> Result<MessagePart, Error> {
        let mime = image_mime(path).ok_or_else(|| Error::AttachmentNotImage {
            path: path.to_path_buf(),
        })?;

        let meta = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if meta.len() > MAX_ATTACHMENT_BYTES {
            return Err(Error::AttachmentTooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: MAX_ATTACHMENT_BYTES,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        tracing::debug!(path = %path.display(), mime, "attached image");

        Ok(MessagePart::InlineData {
            inline_data: InlineData { mime_type: mime.to_string(), data },
        })
    }
}

/// Map an image file extension to its MIME type. Unknown extensions are
/// rejected rather than guessed.
fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
