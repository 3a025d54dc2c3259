//! Client-side image compression before upload.
//!
//! The source is decoded on a blocking worker, scaled down to fit the
//! configured bounds (aspect ratio kept) and re-encoded as JPEG.
//!
//! ```text
//! bytes ──► decode + orient (timeout) ──► resize (triangle) ──► JPEG encode
//! ```
//!
//! EXIF orientation is applied while decoding: the encoded JPEG carries no
//! metadata, so its pixels must already be upright.

use std::io::Cursor;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageError, ImageReader};
use thiserror::Error;

use super::upload::UploadFile;
use crate::debug;

/// Compression failures. Every call settles with one of these or a result.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("failed to decode image")]
    Decode(#[source] ImageError),

    #[error("image decode did not finish within {0:?}")]
    Timeout(Duration),

    #[error("decoded image has no pixels")]
    EmptyImage,

    #[error("failed to encode JPEG")]
    Encode(#[source] ImageError),

    #[error("compression worker failed: {0}")]
    Worker(String),
}

/// Output of a successful compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    /// JPEG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CompressedImage {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Immutable compression settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCompressor {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality factor in `(0, 1]`.
    pub quality: f32,
    pub decode_timeout: Duration,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 900,
            quality: 0.85,
            decode_timeout: Duration::from_secs(10),
        }
    }
}

impl ImageCompressor {
    pub fn new(max_width: u32, max_height: u32, quality: f32) -> Self {
        Self {
            max_width,
            max_height,
            quality,
            ..Self::default()
        }
    }

    /// Target size for a `width` x `height` source.
    ///
    /// Sources within both bounds keep their size. Larger ones are scaled by
    /// `min(max_w / w, max_h / h)` and rounded to the nearest pixel, never
    /// below 1.
    pub fn calculate_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }

        let ratio = f64::min(
            f64::from(self.max_width) / f64::from(width),
            f64::from(self.max_height) / f64::from(height),
        );
        let scale = |side: u32| ((f64::from(side) * ratio).round() as u32).max(1);
        (scale(width), scale(height))
    }

    /// JPEG quality on the encoder's 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (f64::from(self.quality) * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Compress an uploaded image.
    pub async fn compress(&self, file: &UploadFile) -> Result<CompressedImage, CompressError> {
        self.compress_with(file, decode_upright).await
    }

    async fn compress_with<D>(
        &self,
        file: &UploadFile,
        decode: D,
    ) -> Result<CompressedImage, CompressError>
    where
        D: FnOnce(&[u8]) -> Result<DynamicImage, CompressError> + Send + 'static,
    {
        let bytes = file.bytes.clone();
        let decoding = tokio::task::spawn_blocking(move || decode(&bytes));

        let source = tokio::time::timeout(self.decode_timeout, decoding)
            .await
            .map_err(|_| CompressError::Timeout(self.decode_timeout))?
            .map_err(|e| CompressError::Worker(e.to_string()))??;

        if source.width() == 0 || source.height() == 0 {
            return Err(CompressError::EmptyImage);
        }

        let (width, height) = self.calculate_dimensions(source.width(), source.height());
        debug!(
            "compress";
            "{}: {}x{} -> {}x{}",
            file.name, source.width(), source.height(), width, height
        );

        let quality = self.jpeg_quality();
        tokio::task::spawn_blocking(move || encode_jpeg(&source, width, height, quality))
            .await
            .map_err(|e| CompressError::Worker(e.to_string()))?
    }
}

/// Decode `bytes` and rotate or flip the pixels per their EXIF orientation.
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, CompressError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CompressError::Decode(ImageError::IoError(e)))?
        .into_decoder()
        .map_err(CompressError::Decode)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder).map_err(CompressError::Decode)?;
    image.apply_orientation(orientation);
    Ok(image)
}

fn encode_jpeg(
    source: &DynamicImage,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<CompressedImage, CompressError> {
    let resized = if (width, height) == (source.width(), source.height()) {
        source.to_rgb8()
    } else {
        source.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    };

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .encode(
            resized.as_raw(),
            resized.width(),
            resized.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(CompressError::Encode)?;

    Ok(CompressedImage {
        bytes,
        width: resized.width(),
        height: resized.height(),
    })
}
