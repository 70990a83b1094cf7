use std::path::Path;

use mime::Mime;

const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("xml", "application/xml"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

/// Guesses the MIME type of a file part from its filename's extension.
///
/// The lookup is case-insensitive. Unknown or missing extensions yield
/// `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use multipart_upload::guess_content_type;
///
/// assert_eq!(guess_content_type("photo.jpg"), mime::IMAGE_JPEG);
/// assert_eq!(guess_content_type("data.unknownext"), mime::APPLICATION_OCTET_STREAM);
/// ```
pub fn guess_content_type<T: AsRef<str>>(filename: T) -> Mime {
    Path::new(filename.as_ref())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| EXTENSIONS.iter().find(|(known, _)| *known == ext))
        .and_then(|(_, mime)| mime.parse::<Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_known_extensions() {
        assert_eq!(guess_content_type("photo.jpg"), mime::IMAGE_JPEG);
        assert_eq!(guess_content_type("PHOTO.JPEG"), mime::IMAGE_JPEG);
        assert_eq!(guess_content_type("a-text-file.txt"), mime::TEXT_PLAIN);
        assert_eq!(guess_content_type("report.pdf"), mime::APPLICATION_PDF);
        assert_eq!(guess_content_type("dir/archive.tar.gz").essence_str(), "application/gzip");
        assert_eq!(guess_content_type("logo.svg"), mime::IMAGE_SVG);
    }

    #[test]
    fn test_guess_falls_back_to_octet_stream() {
        assert_eq!(guess_content_type("data.unknownext"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(guess_content_type("x.bin"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(guess_content_type("README"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(guess_content_type(".bashrc"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(guess_content_type(""), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn test_every_table_entry_parses() {
        for (ext, literal) in EXTENSIONS {
            assert!(literal.parse::<Mime>().is_ok(), "bad mime for .{}", ext);
        }
    }
}
