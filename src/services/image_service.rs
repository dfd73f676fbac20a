//! Validation and naming of uploaded recipe images.

use image::ImageFormat;
use uuid::Uuid;

use crate::web::error::AppError;

/// Directory (relative to the media root) recipe images are stored in.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Checks that `bytes` is an image the server can fully decode, and returns its format.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, AppError> {
    let invalid = || {
        AppError::InvalidInput(
            "image: Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                .to_string(),
        )
    };

    if bytes.is_empty() {
        return Err(AppError::InvalidInput(
            "image: The submitted file is empty.".to_string(),
        ));
    }
    let format = image::guess_format(bytes).map_err(|_| invalid())?;
    image::load_from_memory_with_format(bytes, format).map_err(|_| invalid())?;
    Ok(format)
}

/// Builds a fresh, collision-free storage path for a recipe image.
pub fn recipe_image_path(format: ImageFormat) -> String {
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), extension)
}

#[cfg(test)]
pub(crate) fn sample_jpeg() -> Vec<u8> {
    use std::io::Cursor;

    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(10, 10));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_jpeg_accepted() {
        let format = validate_image(&sample_jpeg()).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_text_rejected() {
        let err = validate_image(b"notimage").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate_image(&[]).is_err());
    }

    #[test]
    fn test_image_path_uses_format_extension() {
        let path = recipe_image_path(ImageFormat::Jpeg);
        assert!(path.starts_with("uploads/recipe/"));
        assert!(path.ends_with(".jpg"));

        let other = recipe_image_path(ImageFormat::Png);
        assert!(other.ends_with(".png"));
        assert_ne!(path, other);
    }
}
