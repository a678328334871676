//! Preview input and output types

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

/// One upload, as seen by the pipeline. Borrowed from the upload workflow for the
/// duration of a single call.
#[derive(Debug, Clone, Copy)]
pub struct PreviewRequest<'a> {
    pub bytes: &'a [u8],
    pub content_type: Option<&'a str>,
    /// Used only for extension inference and workspace file naming.
    pub original_filename: Option<&'a str>,
}

impl<'a> PreviewRequest<'a> {
    pub fn new(
        bytes: &'a [u8],
        content_type: Option<&'a str>,
        original_filename: Option<&'a str>,
    ) -> Self {
        Self {
            bytes,
            content_type,
            original_filename,
        }
    }
}

/// PNG-encoded preview raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPreview {
    bytes: Bytes,
    width: u32,
    height: u32,
}

impl EncodedPreview {
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn new(bytes: impl Into<Bytes>, width: u32, height: u32) -> Self {
        Self {
            bytes: bytes.into(),
            width,
            height,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Standard-alphabet base64, the form stored on the document record.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URL a web client can use directly as an image source.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", Self::MIME_TYPE, self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_forms() {
        let preview = EncodedPreview::new(vec![0x89, b'P', b'N', b'G'], 1, 1);
        assert_eq!(preview.to_base64(), "iVBORw==");
        assert_eq!(preview.to_data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_accessors() {
        let preview = EncodedPreview::new(Bytes::from_static(b"png"), 48, 32);
        assert_eq!(preview.dimensions(), (48, 32));
        assert_eq!(preview.as_bytes(), b"png");
        assert_eq!(preview.into_bytes(), Bytes::from_static(b"png"));
    }
}
