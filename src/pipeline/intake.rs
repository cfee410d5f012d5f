//! Intake: turn a user-selected file into a validated in-memory image.
//!
//! ## Validation order
//!
//! The declared type (file extension) is checked before any bytes are read,
//! so a `.txt` file is rejected without touching the disk contents. Files
//! that pass the declared check are then sniffed by magic bytes — a file
//! named `photo.jpg` that contains no recognisable image data fails with
//! [`BgoneError::FileReadFailure`] rather than reaching the API. When the
//! two disagree on the concrete format, the sniffed one wins: the API cares
//! about the actual bytes, not the name.

use crate::error::BgoneError;
use crate::output::ImageDetails;
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// The user-selected image, read into memory and validated.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Raw file bytes, exactly as read.
    pub bytes: Vec<u8>,
    /// MIME type of the sniffed format.
    pub mime: String,
    /// Name the file was selected under (used in the multipart upload).
    pub file_name: String,
}

/// What the file extension declares about a file, before reading it.
enum DeclaredType {
    /// Extension maps to a known image format.
    Image,
    /// Extension present but not an image type.
    NotAnImage,
    /// No extension to go by; sniffing decides.
    Unknown,
}

fn declared_type(path: &Path) -> DeclaredType {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => match ImageFormat::from_extension(ext) {
            Some(_) => DeclaredType::Image,
            None => DeclaredType::NotAnImage,
        },
        None => DeclaredType::Unknown,
    }
}

/// Read and validate a file from disk.
///
/// Rejects non-image declared types up front, then sniffs the real format
/// from the first bytes.
pub fn read_source(path: &Path) -> Result<SourceImage, BgoneError> {
    let declared = declared_type(path);
    if matches!(declared, DeclaredType::NotAnImage) {
        return Err(BgoneError::InvalidInputType {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| BgoneError::FileReadFailure {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    finish_intake(bytes, file_name, declared, path)
}

/// Validate raw bytes that did not come from a file on disk.
///
/// `file_name` is used for the declared-type check when it carries an
/// extension, and is forwarded to the API in the multipart upload.
pub fn source_from_bytes(bytes: Vec<u8>, file_name: &str) -> Result<SourceImage, BgoneError> {
    let path = Path::new(file_name);
    let declared = declared_type(path);
    if matches!(declared, DeclaredType::NotAnImage) {
        return Err(BgoneError::InvalidInputType {
            path: path.to_path_buf(),
        });
    }
    finish_intake(bytes, file_name.to_string(), declared, path)
}

/// Shared tail of both intake paths: sniff the format and build the source.
fn finish_intake(
    bytes: Vec<u8>,
    file_name: String,
    declared: DeclaredType,
    path: &Path,
) -> Result<SourceImage, BgoneError> {
    match image::guess_format(&bytes) {
        Ok(format) => {
            debug!(
                "Intake: '{}' sniffed as {:?}, {} bytes",
                file_name,
                format,
                bytes.len()
            );
            Ok(SourceImage {
                bytes,
                mime: format.to_mime_type().to_string(),
                file_name,
            })
        }
        // Declared an image but the bytes disagree: defined as a read failure.
        Err(_) if matches!(declared, DeclaredType::Image) => Err(BgoneError::FileReadFailure {
            path: path.to_path_buf(),
            detail: "not a recognisable image format".to_string(),
        }),
        // Nothing declared and nothing sniffed: not an image at all.
        Err(_) => Err(BgoneError::InvalidInputType {
            path: path.to_path_buf(),
        }),
    }
}

/// Report format, dimensions, and size without any network call.
pub fn image_details(source: &SourceImage) -> Result<ImageDetails, BgoneError> {
    let reader = image::ImageReader::new(Cursor::new(&source.bytes))
        .with_guessed_format()
        .map_err(|e| BgoneError::FileReadFailure {
            path: Path::new(&source.file_name).to_path_buf(),
            detail: e.to_string(),
        })?;

    let format = reader
        .format()
        .ok_or_else(|| BgoneError::FileReadFailure {
            path: Path::new(&source.file_name).to_path_buf(),
            detail: "not a recognisable image format".to_string(),
        })?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| BgoneError::FileReadFailure {
            path: Path::new(&source.file_name).to_path_buf(),
            detail: e.to_string(),
        })?;

    Ok(ImageDetails {
        file_name: source.file_name.clone(),
        format: format.extensions_str().first().unwrap_or(&"unknown").to_string(),
        mime: format.to_mime_type().to_string(),
        width,
        height,
        byte_len: source.bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 4])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        buf
    }

    #[test]
    fn txt_extension_is_rejected_before_reading() {
        // The path does not exist; rejection must come from the extension alone.
        let err = read_source(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, BgoneError::InvalidInputType { .. }));
    }

    #[test]
    fn missing_image_file_is_a_read_failure() {
        let err = read_source(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, BgoneError::FileReadFailure { .. }));
    }

    #[test]
    fn png_bytes_are_sniffed() {
        let source = source_from_bytes(png_bytes(), "pic.png").expect("intake");
        assert_eq!(source.mime, "image/png");
        assert_eq!(source.file_name, "pic.png");
    }

    #[test]
    fn sniffed_format_wins_over_extension() {
        // PNG bytes under a .jpg name: upload as what the bytes actually are.
        let source = source_from_bytes(png_bytes(), "pic.jpg").expect("intake");
        assert_eq!(source.mime, "image/png");
    }

    #[test]
    fn image_extension_with_garbage_bytes_is_a_read_failure() {
        let err = source_from_bytes(b"this is not an image".to_vec(), "pic.png").unwrap_err();
        assert!(matches!(err, BgoneError::FileReadFailure { .. }));
    }

    #[test]
    fn no_extension_with_garbage_bytes_is_invalid_input() {
        let err = source_from_bytes(b"plain text".to_vec(), "clipboard").unwrap_err();
        assert!(matches!(err, BgoneError::InvalidInputType { .. }));
    }

    #[test]
    fn details_report_dimensions_and_size() {
        let bytes = png_bytes();
        let len = bytes.len();
        let source = source_from_bytes(bytes, "pic.png").expect("intake");
        let details = image_details(&source).expect("details");
        assert_eq!((details.width, details.height), (4, 3));
        assert_eq!(details.byte_len, len);
        assert_eq!(details.mime, "image/png");
    }
}
