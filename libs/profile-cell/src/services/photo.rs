use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::Path;
use tracing::debug;

use crate::models::{ImageFormat, ProfileError, MAX_PHOTO_BYTES};

/// Encodes an image as a `data:image/...;base64,` URL. The format is taken
/// from the file contents; a declared type that disagrees is rejected.
pub fn encode_photo(bytes: &[u8], declared_type: Option<&str>) -> Result<String, ProfileError> {
    if bytes.is_empty() {
        return Err(ProfileError::EmptyImage);
    }

    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(ProfileError::ImageTooLarge {
            size: bytes.len(),
            max: MAX_PHOTO_BYTES,
        });
    }

    let format = ImageFormat::sniff(bytes)
        .ok_or_else(|| ProfileError::UnsupportedImage("unrecognised file contents".to_string()))?;

    if let Some(declared) = declared_type {
        if ImageFormat::from_mime(declared) != Some(format) {
            return Err(ProfileError::UnsupportedImage(declared.to_string()));
        }
    }

    debug!("Encoding {} byte {} photo", bytes.len(), format.mime_type());
    Ok(format!("data:{};base64,{}", format.mime_type(), BASE64.encode(bytes)))
}

pub async fn load_photo(path: impl AsRef<Path>) -> Result<String, ProfileError> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() as usize > MAX_PHOTO_BYTES {
        return Err(ProfileError::ImageTooLarge {
            size: metadata.len() as usize,
            max: MAX_PHOTO_BYTES,
        });
    }

    let bytes = tokio::fs::read(path).await?;
    encode_photo(&bytes, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_png_becomes_data_url() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(b"rest");

        let url = encode_photo(&bytes, Some("image/png")).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(
            BASE64.decode(url.trim_start_matches("data:image/png;base64,")).unwrap(),
            bytes
        );
    }

    #[test]
    fn test_jpeg_detected_without_declared_type() {
        let url = encode_photo(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], None).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_rejects_other_formats_and_mismatches() {
        assert_matches!(
            encode_photo(b"GIF89a....", None),
            Err(ProfileError::UnsupportedImage(_))
        );
        assert_matches!(
            encode_photo(&PNG_HEADER, Some("image/gif")),
            Err(ProfileError::UnsupportedImage(_))
        );
        assert_matches!(encode_photo(&[], None), Err(ProfileError::EmptyImage));
    }

    #[test]
    fn test_rejects_oversized_image() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(MAX_PHOTO_BYTES + 1, 0);
        assert_matches!(
            encode_photo(&bytes, None),
            Err(ProfileError::ImageTooLarge { size, .. }) if size == MAX_PHOTO_BYTES + 1
        );
    }

    #[tokio::test]
    async fn test_load_photo_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&PNG_HEADER).unwrap();

        let url = load_photo(file.path()).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        assert_matches!(
            load_photo(file.path().with_extension("missing")).await,
            Err(ProfileError::Io(_))
        );
    }
}
