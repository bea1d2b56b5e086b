// Frame overlay compositing

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use log::debug;
use std::io::Read;

use crate::error::SwapError;

const COMPOSITE_JPEG_QUALITY: u8 = 95;
const MAX_DOWNLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// Result image with a decorative frame stretched over it.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    pub bytes: Vec<u8>,
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Fetches the swap result and the frame, draws the frame over the
/// result at the result's native dimensions, and returns the combined
/// JPEG as bytes plus a data URL.
pub fn combine(result_url: &str, frame_url: &str) -> Result<CompositeImage, SwapError> {
    let base_bytes = fetch_image(result_url)?;
    let frame_bytes = fetch_image(frame_url)?;
    combine_bytes(&base_bytes, &frame_bytes)
}

pub fn combine_bytes(base_bytes: &[u8], frame_bytes: &[u8]) -> Result<CompositeImage, SwapError> {
    let base = image::load_from_memory(base_bytes)
        .map_err(|e| SwapError::Image(format!("Failed to decode result image: {}", e)))?;
    let frame = image::load_from_memory(frame_bytes)
        .map_err(|e| SwapError::Image(format!("Failed to decode frame image: {}", e)))?;

    let mut canvas = base.to_rgba8();
    let (width, height) = canvas.dimensions();

    // Frame is stretched to cover the whole result, transparency intact.
    let frame_resized = image::imageops::resize(&frame.to_rgba8(), width, height, FilterType::Triangle);
    image::imageops::overlay(&mut canvas, &frame_resized, 0, 0);

    let rgb = image::DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, COMPOSITE_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| SwapError::Image(format!("Failed to encode combined image: {}", e)))?;

    debug!("Combined {}x{} image with frame ({} bytes)", width, height, bytes.len());

    let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(&bytes));
    Ok(CompositeImage { bytes, data_url, width, height })
}

fn fetch_image(url: &str) -> Result<Vec<u8>, SwapError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| SwapError::Image(format!("Failed to fetch {}: {}", url, e)))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_DOWNLOAD_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| SwapError::Image(format!("Failed to read {}: {}", url, e)))?;

    Ok(bytes)
}
