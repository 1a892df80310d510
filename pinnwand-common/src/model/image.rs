use image::{ImageFormat, io::Reader};
use std::io::Cursor;
use thiserror::Error;

pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_IMAGE_WIDTH: u32 = 4096;
pub const MAX_IMAGE_HEIGHT: u32 = 4096;

/// Why an uploaded image was rejected. The messages are served verbatim
/// under the `image` field of the validation reply.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum ImageValidationError {
    #[error("Image size larger than 2MB!")]
    TooLarge,
    #[error("Image height larger than {MAX_IMAGE_HEIGHT}px!")]
    TooTall,
    #[error("Image width larger than {MAX_IMAGE_WIDTH}px!")]
    TooWide,
    #[error(
        "Upload a valid image. The file you uploaded was either not an image \
        or a corrupted image."
    )]
    Unreadable,
}

/// Message for a multipart upload that carries no `image` part.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("No file was submitted.")]
pub struct NoFileError;

/// Format and dimensions of an accepted upload.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// File extension the stored copy should carry.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// Checks an upload against the size and dimension limits without decoding
/// the pixel data; only the header is parsed.
pub fn validate_image(bytes: &[u8]) -> Result<ImageInfo, ImageValidationError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageValidationError::TooLarge);
    }

    let reader = Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| ImageValidationError::Unreadable)?;
    let format = reader.format().ok_or(ImageValidationError::Unreadable)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|_| ImageValidationError::Unreadable)?;

    if width > MAX_IMAGE_WIDTH {
        return Err(ImageValidationError::TooWide);
    }
    if height > MAX_IMAGE_HEIGHT {
        return Err(ImageValidationError::TooTall);
    }

    Ok(ImageInfo {
        format,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use crate::model::image::{ImageValidationError, MAX_IMAGE_BYTES, validate_image};
    use image::ImageOutputFormat;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::new(width, height);
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn small_png_passes() {
        let info = validate_image(&png_bytes(16, 9)).unwrap();
        assert_eq!(info.extension(), "png");
        assert_eq!((info.width, info.height), (16, 9));
    }

    #[test]
    fn oversized_payload_is_rejected_before_parsing() {
        let bytes = vec![0; MAX_IMAGE_BYTES + 1];
        assert_eq!(validate_image(&bytes), Err(ImageValidationError::TooLarge));
    }

    #[test]
    fn dimension_limits() {
        assert_eq!(
            validate_image(&png_bytes(1, 4097)),
            Err(ImageValidationError::TooTall)
        );
        assert_eq!(
            validate_image(&png_bytes(4097, 1)),
            Err(ImageValidationError::TooWide)
        );
        // Width is checked first when both dimensions are over the limit.
        assert_eq!(
            validate_image(&png_bytes(4097, 4097)),
            Err(ImageValidationError::TooWide)
        );
        assert!(validate_image(&png_bytes(4096, 4096)).is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            validate_image(b"certainly not an image"),
            Err(ImageValidationError::Unreadable)
        );
    }
}
