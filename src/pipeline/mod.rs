// Image validation and adaptive compression
pub mod composite;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use log::{debug, info};

use crate::error::SwapError;
use crate::models::{ProcessedImage, UploadedImage};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 2048;

const MOBILE_BYTES: usize = 3 * 1024 * 1024;
const MOBILE_DIMENSION: u32 = 2000;
const LARGE_WARNING_BYTES: usize = 5 * 1024 * 1024;
const SECOND_PASS_BYTES: usize = 5 * 1024 * 1024;
const CEILING_MARGIN: f64 = 0.9;

/// Resize ceiling and JPEG quality for one encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPlan {
    pub max_edge: u32,
    pub quality: u8,
}

const DEFAULT_PLAN: CompressionPlan = CompressionPlan { max_edge: 2048, quality: 80 };
const MOBILE_PLAN: CompressionPlan = CompressionPlan { max_edge: 1600, quality: 75 };
const SECOND_PASS_PLAN: CompressionPlan = CompressionPlan { max_edge: 1200, quality: 70 };

/// Large camera uploads get squeezed harder up front.
pub fn is_likely_mobile_image(size: usize, width: u32, height: u32) -> bool {
    size > MOBILE_BYTES && width.max(height) > MOBILE_DIMENSION
}

pub fn needs_compression(size: usize, width: u32, height: u32) -> bool {
    size > MAX_IMAGE_BYTES
        || width > MAX_IMAGE_DIMENSION
        || height > MAX_IMAGE_DIMENSION
        || is_likely_mobile_image(size, width, height)
}

pub fn first_pass_plan(size: usize, width: u32, height: u32) -> CompressionPlan {
    if is_likely_mobile_image(size, width, height) {
        MOBILE_PLAN
    } else {
        DEFAULT_PLAN
    }
}

/// A result still close to the ceiling gets exactly one more pass.
pub fn needs_second_pass(compressed_size: usize) -> bool {
    compressed_size as f64 > MAX_IMAGE_BYTES as f64 * CEILING_MARGIN
        || compressed_size > SECOND_PASS_BYTES
}

/// Fits (width, height) inside max_edge, preserving aspect ratio.
pub fn scaled_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let edge = width.max(height);
    if edge <= max_edge {
        return (width, height);
    }
    let scale = max_edge as f64 / edge as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

pub fn format_file_size(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp])
}

/// Advisory pre-upload check. Only a non-image MIME type is an error;
/// everything else at most produces a warning, compression handles the
/// rest.
pub fn validate(upload: &UploadedImage) -> Result<Option<String>, SwapError> {
    if !upload.content_type.starts_with("image/") {
        return Err(SwapError::Validation(
            "Please upload an image file.".to_string(),
        ));
    }

    let size = upload.bytes.len();
    if size > MAX_IMAGE_BYTES {
        return Ok(Some(format!(
            "Image size ({}) exceeds 10MB. It will be automatically compressed.",
            format_file_size(size)
        )));
    }
    if size > LARGE_WARNING_BYTES {
        return Ok(Some(format!(
            "Large image detected ({}). It will be compressed to fit size limits.",
            format_file_size(size)
        )));
    }

    Ok(None)
}

/// Decodes the upload and runs the adaptive compression: at most two
/// passes, the second only when the first result is still near the
/// ceiling.
pub fn process(upload: &UploadedImage) -> Result<ProcessedImage, SwapError> {
    let decoded = image::load_from_memory(&upload.bytes).map_err(|e| {
        SwapError::Image(format!(
            "Failed to process image {}: {}. Please try a different image.",
            upload.file_name, e
        ))
    })?;
    let (original_width, original_height) = decoded.dimensions();
    let original_size = upload.bytes.len();

    if !needs_compression(original_size, original_width, original_height) {
        return Ok(ProcessedImage {
            file_name: upload.file_name.clone(),
            content_type: upload.content_type.clone(),
            bytes: upload.bytes.clone(),
            width: original_width,
            height: original_height,
            size: original_size,
            original_width: None,
            original_height: None,
            original_size: None,
        });
    }

    let plan = first_pass_plan(original_size, original_width, original_height);
    debug!(
        "Compressing {} ({} at {}x{}) with max edge {} quality {}",
        upload.file_name,
        format_file_size(original_size),
        original_width,
        original_height,
        plan.max_edge,
        plan.quality
    );

    let (mut bytes, mut width, mut height) = encode_scaled(&decoded, plan)?;

    if needs_second_pass(bytes.len()) {
        debug!("Image still large after first pass, applying stronger compression");
        let (b, w, h) = encode_scaled(&decoded, SECOND_PASS_PLAN)?;
        bytes = b;
        width = w;
        height = h;
    }

    info!(
        "Compressed {} from {} to {}",
        upload.file_name,
        format_file_size(original_size),
        format_file_size(bytes.len())
    );

    Ok(ProcessedImage {
        file_name: jpeg_file_name(&upload.file_name),
        content_type: "image/jpeg".to_string(),
        size: bytes.len(),
        bytes,
        width,
        height,
        original_width: Some(original_width),
        original_height: Some(original_height),
        original_size: Some(original_size),
    })
}

fn encode_scaled(
    decoded: &image::DynamicImage,
    plan: CompressionPlan,
) -> Result<(Vec<u8>, u32, u32), SwapError> {
    let (width, height) = decoded.dimensions();
    let (target_w, target_h) = scaled_dimensions(width, height, plan.max_edge);

    let rgb = decoded.to_rgb8();
    let resized = if (target_w, target_h) == (width, height) {
        rgb
    } else {
        image::imageops::resize(&rgb, target_w, target_h, FilterType::Triangle)
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, plan.quality);
    resized
        .write_with_encoder(encoder)
        .map_err(|e| SwapError::Image(format!("Failed to encode image: {}", e)))?;

    Ok((out, target_w, target_h))
}

fn jpeg_file_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) => format!("{}.jpg", stem),
        None => format!("{}.jpg", name),
    }
}
