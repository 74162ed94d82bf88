//! Converting user files and captured crops into data URIs.

use super::{DataUri, UploadError};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat, RgbImage};
use std::path::Path;

/// MIME type of camera captures.
pub const JPEG_MIME: &str = "image/jpeg";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Reads a user-selected file into a data URI.
///
/// Images of any type and PDF documents are accepted. The type is sniffed
/// from the content first and from the extension when sniffing fails.
pub fn read_image_file(path: impl AsRef<Path>) -> Result<DataUri, UploadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| UploadError::Read(e.to_string()))?;
    if bytes.is_empty() {
        return Err(UploadError::Read(format!("{} is empty", path.display())));
    }

    let mime = sniff_mime(&bytes)
        .or_else(|| mime_from_extension(path))
        .ok_or_else(|| UploadError::UnsupportedType(path.display().to_string()))?;

    tracing::debug!(
        path = %path.display(),
        mime,
        bytes = bytes.len(),
        "Read upload"
    );
    Ok(DataUri::encode(mime, &bytes))
}

/// Encodes a cropped capture as a JPEG data URI.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<DataUri, UploadError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .map_err(|e| UploadError::Encode(e.to_string()))?;

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        bytes = buf.len(),
        "Encoded capture"
    );
    Ok(DataUri::encode(JPEG_MIME, &buf))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PDF_MAGIC) {
        return Some("application/pdf");
    }
    let mime = match image::guess_format(bytes).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => return None,
    };
    Some(mime)
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_read_png_by_content() {
        let dir = TempDir::new().unwrap();
        // Misleading extension: content wins
        let path = dir.path().join("front.bin");
        RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let uri = read_image_file(&path).unwrap();
        assert_eq!(uri.mime(), "image/png");
        assert!(uri.to_string().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_read_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").unwrap();

        assert_eq!(read_image_file(&path).unwrap().mime(), "application/pdf");
    }

    #[test]
    fn test_extension_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.HEIC");
        std::fs::write(&path, b"not sniffable").unwrap();

        assert_eq!(read_image_file(&path).unwrap().mime(), "image/heic");
    }

    #[test]
    fn test_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        assert!(matches!(
            read_image_file(&path),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_image_file(dir.path().join("missing.png")),
            Err(UploadError::Read(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_decodes_back() {
        let image = RgbImage::from_pixel(12, 8, Rgb([200, 100, 50]));
        let uri = encode_jpeg(&image, 90).unwrap();

        assert_eq!(uri.mime(), JPEG_MIME);
        let decoded = image::load_from_memory(&uri.decode().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }
}
