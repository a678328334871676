//! Content-type dispatch

/// MIME fragments that identify word-processing, spreadsheet and presentation uploads,
/// legacy binary formats and OOXML alike.
const OFFICE_MARKERS: [&str; 5] = [
    "officedocument",
    "msword",
    "ms-excel",
    "ms-powerpoint",
    "vnd.openxmlformats",
];

/// Which handler a declared content type maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewKind {
    RasterImage,
    Pdf,
    Video,
    OfficeDocument,
}

impl PreviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewKind::RasterImage => "raster_image",
            PreviewKind::Pdf => "pdf",
            PreviewKind::Video => "video",
            PreviewKind::OfficeDocument => "office_document",
        }
    }
}

impl std::fmt::Display for PreviewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a declared MIME type. `None` means no preview is attempted.
///
/// Matching is case-sensitive on the string as received.
pub fn classify(content_type: Option<&str>) -> Option<PreviewKind> {
    let content_type = content_type?;
    if content_type.is_empty() {
        return None;
    }

    if content_type.starts_with("image/") {
        Some(PreviewKind::RasterImage)
    } else if content_type == "application/pdf" {
        Some(PreviewKind::Pdf)
    } else if content_type.starts_with("video/") {
        Some(PreviewKind::Video)
    } else if OFFICE_MARKERS.iter().any(|m| content_type.contains(m)) {
        Some(PreviewKind::OfficeDocument)
    } else {
        None
    }
}
