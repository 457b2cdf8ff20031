//! Image preparation for uploads: fixed-size square JPEGs for the feed and
//! for avatars, with a fallback to the original bytes when decoding fails.
use image::imageops::FilterType;
use image::GenericImageView;
use log::warn;

pub const POST_IMAGE_SIZE: u32 = 1080;
pub const AVATAR_IMAGE_SIZE: u32 = 320;
pub const JPEG_QUALITY: u8 = 85;
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

#[derive(Debug)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: &'static str,
    pub resized: bool,
}

/// Checks a declared content type against the allowed image types and
/// returns its normalised essence (`image/png`, ...).
pub fn allowed_image_type(content_type: &str) -> Option<String> {
    let parsed: mime::Mime = content_type.trim().parse().ok()?;
    if parsed.type_() != mime::IMAGE {
        return None;
    }
    let essence = parsed.essence_str().to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES.contains(&essence.as_str()).then_some(essence)
}

pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Center-crops to a `size`x`size` square and encodes it as JPEG.
pub fn resize_to_square_jpeg(data: &[u8], size: u32, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(data)?;
    let squared = img.resize_to_fill(size, size, FilterType::Lanczos3);
    let (width, height) = squared.dimensions();
    let rgb = squared.to_rgb8();

    let mut out = Vec::new();
    {
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        encoder.encode(rgb.as_raw(), width, height, image::ColorType::Rgb8)?;
    }
    Ok(out)
}

/// Resizes off the async runtime. A decode or encode failure keeps the
/// original bytes; only a failed blocking task is an error.
pub async fn prepare_upload(
    data: Vec<u8>,
    content_type: &str,
    size: u32,
) -> Result<PreparedImage, tokio::task::JoinError> {
    let original_type = content_type.to_string();
    let (original, resized) = tokio::task::spawn_blocking(move || {
        let resized = resize_to_square_jpeg(&data, size, JPEG_QUALITY);
        (data, resized)
    })
    .await?;

    let prepared = match resized {
        Ok(jpeg) => PreparedImage {
            bytes: jpeg,
            content_type: "image/jpeg".to_string(),
            extension: "jpg",
            resized: true,
        },
        Err(e) => {
            warn!("image resize failed, storing original: {}", e);
            PreparedImage {
                extension: extension_for(&original_type),
                bytes: original,
                content_type: original_type,
                resized: false,
            }
        }
    };
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, _| Rgb([(x % 255) as u8, 40, 90]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn resize_produces_square_jpeg() {
        let jpeg = resize_to_square_jpeg(&png_bytes(300, 120), 64, JPEG_QUALITY).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
        assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn content_types_are_checked() {
        assert_eq!(allowed_image_type("image/PNG").as_deref(), Some("image/png"));
        assert_eq!(allowed_image_type("image/jpeg; charset=binary").as_deref(), Some("image/jpeg"));
        assert_eq!(allowed_image_type("image/svg+xml"), None);
        assert_eq!(allowed_image_type("text/plain"), None);
        assert_eq!(allowed_image_type("not a mime"), None);
    }

    #[tokio::test]
    async fn prepare_upload_resizes_posts_to_fixed_size() {
        let prepared = prepare_upload(png_bytes(200, 100), "image/png", POST_IMAGE_SIZE).await.unwrap();
        assert!(prepared.resized);
        assert_eq!(prepared.content_type, "image/jpeg");
        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (POST_IMAGE_SIZE, POST_IMAGE_SIZE));
    }

    #[tokio::test]
    async fn undecodable_bytes_fall_back_to_original() {
        let garbage = vec![0u8, 1, 2, 3, 4];
        let prepared = prepare_upload(garbage.clone(), "image/webp", POST_IMAGE_SIZE).await.unwrap();
        assert!(!prepared.resized);
        assert_eq!(prepared.bytes, garbage);
        assert_eq!(prepared.content_type, "image/webp");
        assert_eq!(prepared.extension, "webp");
    }
}
