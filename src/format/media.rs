//! Embedded image decoding and sizing

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

use crate::document::ImageSize;
use crate::style::StyleSheet;

/// Decoded image ready to be placed in a container.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub format: MediaFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Image encodings accepted in figures and image tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl MediaFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Png => "png",
            MediaFormat::Jpeg => "jpeg",
            MediaFormat::Gif => "gif",
            MediaFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Png => "image/png",
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Bmp => "image/bmp",
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(MediaFormat::Png),
            ImageFormat::Jpeg => Some(MediaFormat::Jpeg),
            ImageFormat::Gif => Some(MediaFormat::Gif),
            ImageFormat::Bmp => Some(MediaFormat::Bmp),
            _ => None,
        }
    }
}

/// Decode a `data:` URL or bare base64 payload.
///
/// Encodings other than PNG, JPEG, GIF and BMP are re-encoded as PNG.
pub fn decode_image(data: &str) -> Result<EmbeddedImage, String> {
    let payload = match data.trim().strip_prefix("data:") {
        Some(url) => url
            .split_once(',')
            .map(|(_, encoded)| encoded)
            .ok_or_else(|| "data URL has no payload".to_string())?,
        None => data.trim(),
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| format!("not valid base64: {err}"))?;

    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|err| err.to_string())?;
    let guessed = reader
        .format()
        .ok_or_else(|| "unrecognized image encoding".to_string())?;

    match MediaFormat::from_image_format(guessed) {
        Some(format) => {
            let (pixel_width, pixel_height) =
                reader.into_dimensions().map_err(|err| err.to_string())?;
            Ok(EmbeddedImage {
                bytes,
                format,
                pixel_width,
                pixel_height,
            })
        }
        None => {
            let decoded = reader.decode().map_err(|err| err.to_string())?;
            let mut png = Vec::new();
            decoded
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|err| err.to_string())?;
            Ok(EmbeddedImage {
                bytes: png,
                format: MediaFormat::Png,
                pixel_width: decoded.width(),
                pixel_height: decoded.height(),
            })
        }
    }
}

/// Display size in inches: preset width, clamped to the column, height capped.
pub fn display_size(image: &EmbeddedImage, size: ImageSize, style: &StyleSheet, columns: u8) -> (f32, f32) {
    let mut width = style.figures.width(size).min(style.page.column_width(columns));
    let aspect = if image.pixel_width == 0 {
        1.0
    } else {
        image.pixel_height as f32 / image.pixel_width as f32
    };
    let mut height = width * aspect;
    if height > style.figures.max_height {
        height = style.figures.max_height;
        width = height / aspect;
    }
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> String {
        let img = image::RgbImage::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decodes_data_url_and_bare_base64() {
        let encoded = png(4, 2);
        let bare = decode_image(&encoded).unwrap();
        let url = decode_image(&format!("data:image/png;base64,{encoded}")).unwrap();

        assert_eq!(bare, url);
        assert_eq!(bare.format, MediaFormat::Png);
        assert_eq!((bare.pixel_width, bare.pixel_height), (4, 2));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_image("not base64 at all!").is_err());
        assert!(decode_image(&STANDARD.encode(b"plain text")).is_err());
    }

    #[test]
    fn test_tall_images_are_capped() {
        let image = decode_image(&png(10, 100)).unwrap();
        let (width, height) = display_size(&image, ImageSize::Large, &StyleSheet::default(), 2);
        assert_eq!(height, 4.0);
        assert!((width - 0.4).abs() < 1e-4);
    }
}
