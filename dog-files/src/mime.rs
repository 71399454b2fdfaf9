/// Fallback for extensions with no known mapping
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve a MIME type from the file name's extension.
///
/// Unknown or missing extensions resolve to `application/octet-stream`.
pub fn detect_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_document_types() {
        assert_eq!(detect_mime_type("report.pdf"), "application/pdf");
        assert_eq!(detect_mime_type("photo.PNG"), "image/png");
        assert_eq!(
            detect_mime_type("letter.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn test_unknown_extension_is_opaque() {
        assert_eq!(detect_mime_type("blob.zzzunknown"), OCTET_STREAM);
        assert_eq!(detect_mime_type("Makefile"), OCTET_STREAM);
    }
}
