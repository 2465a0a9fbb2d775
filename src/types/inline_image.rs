use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An image attached inline to a user message.
///
/// Attachments travel through the chat as self-describing data URIs of the
/// form `data:<mime-type>;base64,<payload>` and are stored that way too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InlineImage {
    mime_type: String,
    data: String,
}

impl InlineImage {
    /// Creates an attachment from a MIME type and a base64 payload.
    ///
    /// The payload must be standard base64.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        let data = data.into();
        if mime_type.trim().is_empty() {
            return Err(Error::attachment("data URI has an empty MIME type"));
        }
        if data.is_empty() {
            return Err(Error::attachment("data URI has an empty payload"));
        }
        base64::engine::general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| Error::attachment(format!("data URI payload is not base64: {e}")))?;
        Ok(Self { mime_type, data })
    }

    /// Parses a `data:<mime-type>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::attachment("invalid data URI: missing 'data:' scheme"))?;
        let (mime_type, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| Error::attachment("invalid data URI: missing ';base64,' marker"))?;
        Self::new(mime_type, data)
    }

    /// Reads an image file and encodes it as an attachment.
    ///
    /// The MIME type is taken from the extension, which must be one of
    /// jpeg, jpg, png, gif or webp.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let mime_type = match extension.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => {
                return Err(Error::attachment(format!(
                    "unsupported image type for {}: must be jpeg, png, gif, or webp",
                    path.display()
                )));
            }
        };

        let mut file = File::open(path)
            .map_err(|err| Error::io(format!("failed to open {}", path.display()), err))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;

        let data = base64::engine::general_purpose::STANDARD.encode(&buffer);
        Self::new(mime_type, data)
    }

    /// The MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Size of the decoded payload in bytes.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4) * 3 - padding
    }

    /// Renders the attachment back into data-URI form.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

impl fmt::Display for InlineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.mime_type, self.decoded_len())
    }
}

impl FromStr for InlineImage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_data_uri(s)
    }
}

impl TryFrom<String> for InlineImage {
    type Error = Error;

    fn try_from(uri: String) -> Result<Self> {
        Self::from_data_uri(&uri)
    }
}

impl From<InlineImage> for String {
    fn from(image: InlineImage) -> Self {
        image.to_data_uri()
    }
}
