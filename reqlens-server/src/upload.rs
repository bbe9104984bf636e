//! multipart/form-data upload parsing

use multipart::server::Multipart;
use std::io::Read;
use tracing::warn;

/// Form field the document is expected in
pub const FILE_FIELD: &str = "file";

/// A file pulled out of a multipart request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied filename, empty when the client sent none
    pub filename: String,
    pub data: Vec<u8>,
}

/// Extract the boundary from a `multipart/form-data` content type
pub fn multipart_boundary(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';');
    let mime = parts.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }

    parts
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

/// Read the `file` field from a multipart body
///
/// Returns `None` when the body is not multipart, is malformed, or has no
/// `file` field.
pub fn read_file_field(content_type: Option<&str>, body: &[u8]) -> Option<UploadedFile> {
    let boundary = content_type.and_then(multipart_boundary)?;
    let mut multipart = Multipart::with_body(body, boundary);

    loop {
        let mut field = match multipart.read_entry() {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return None;
            }
        };

        if &*field.headers.name != FILE_FIELD {
            continue;
        }

        let filename = field.headers.filename.clone().unwrap_or_default();
        let mut data = Vec::new();
        if let Err(e) = field.data.read_to_end(&mut data) {
            warn!("Failed to read uploaded file data: {}", e);
            return None;
        }

        return Some(UploadedFile { filename, data });
    }
}
