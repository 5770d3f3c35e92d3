use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Side length of the square model input.
pub const INPUT_SIZE: u32 = 224;

/// Number of color channels fed to the model (RGB).
pub const RGB_CHANNELS: usize = 3;

/// Largest upload accepted before decoding is attempted.
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// A single-item NHWC batch: `[1, 224, 224, 3]`, values in `[0.0, 1.0]`.
pub type ImageBatch = Array4<f32>;

/// Interpolation used when resizing to the model input size.
///
/// Different filters produce different scores for the same upload, so the
/// filter is always pinned explicitly rather than left to a library default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
            ResizeFilter::Bicubic => FilterType::CatmullRom,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
        };
        f.write_str(name)
    }
}

impl FromStr for ResizeFilter {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" | "triangle" => Ok(Self::Bilinear),
            "bicubic" | "catmullrom" => Ok(Self::Bicubic),
            other => Err(ClassifierError::ValidationError(format!(
                "Unknown resize filter '{}' (expected nearest, bilinear or bicubic)",
                other
            ))),
        }
    }
}

/// Decodes raw upload bytes (PNG, JPEG, ...) into an image.
///
/// # Errors
/// - `InvalidImage` if the data is empty, larger than [`MAX_IMAGE_BYTES`],
///   or not in a format the decoder recognizes
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    if bytes.is_empty() {
        return Err(ClassifierError::InvalidImage("Image data is empty".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ClassifierError::InvalidImage(format!(
            "Image is too large ({} bytes, max is {})",
            bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }

    image::load_from_memory(bytes)
        .map_err(|e| ClassifierError::InvalidImage(format!("Failed to decode image: {}", e)))
}

/// Converts an image into the model's input batch.
///
/// The image is:
/// 1. Converted to 8-bit RGB (grayscale X-rays are expanded to three channels)
/// 2. Resized to exactly 224x224 with the given filter, ignoring aspect ratio
/// 3. Scaled from `0..=255` to `[0.0, 1.0]`
/// 4. Wrapped as a single-item NHWC batch
///
/// # Errors
/// - `InvalidImage` if either dimension of the source image is zero
pub fn preprocess(img: &DynamicImage, filter: ResizeFilter) -> Result<ImageBatch, ClassifierError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ClassifierError::InvalidImage(format!(
            "Image has no pixels ({}x{})",
            width, height
        )));
    }

    let rgb = img.to_rgb8();
    let resized = imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, filter.into());

    let side = INPUT_SIZE as usize;
    let values: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();

    Array4::from_shape_vec((1, side, side, RGB_CHANNELS), values)
        .map_err(|e| ClassifierError::InvalidImage(format!("Failed to build input batch: {}", e)))
}
