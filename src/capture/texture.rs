use crate::errors::PanoramaError;
use crate::types::ImageFrame;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Decoded RGBA8 texture, ready for upload by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchTexture {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub rgba: Vec<u8>,
    /// Size of the intermediate JPEG in bytes
    pub encoded_bytes: usize,
}

/// Turn a raw `rgb8` or `rgba8` frame into a patch texture.
///
/// The frame is JPEG-encoded at `jpeg_quality` and decoded back into RGBA,
/// then downscaled if either edge exceeds `max_dimension`. CPU heavy; call
/// from a blocking task. Frames in any other layout, or whose buffer length
/// does not match their size, fail with `TextureDecode`.
pub fn prepare_texture(
    frame: &ImageFrame,
    jpeg_quality: u8,
    max_dimension: u32,
) -> Result<PatchTexture, PanoramaError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PanoramaError::TextureDecode(format!(
            "empty frame {}x{}",
            frame.width, frame.height
        )));
    }

    let img = frame_to_rgb(frame)?;

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, jpeg_quality.clamp(1, 100));
    DynamicImage::ImageRgb8(img).write_with_encoder(encoder)?;

    let decoded = image::load_from_memory_with_format(&encoded, image::ImageFormat::Jpeg)?;
    let decoded = if decoded.width() > max_dimension || decoded.height() > max_dimension {
        log::debug!(
            "Downscaling texture {}x{} to fit {}",
            decoded.width(),
            decoded.height(),
            max_dimension
        );
        decoded.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        decoded
    };

    let rgba = decoded.to_rgba8();
    Ok(PatchTexture {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
        encoded_bytes: encoded.len(),
    })
}

/// Wrap the frame bytes as an RGB image. The buffer must match the frame's
/// layout exactly; the JPEG encoder rejects anything else by panicking.
fn frame_to_rgb(frame: &ImageFrame) -> Result<RgbImage, PanoramaError> {
    let channels = match frame.format.as_str() {
        "rgb8" => 3,
        "rgba8" => 4,
        other => {
            return Err(PanoramaError::TextureDecode(format!(
                "unsupported frame format {:?}",
                other
            )))
        }
    };

    let expected = frame.width as usize * frame.height as usize * channels;
    if frame.data.len() != expected {
        return Err(PanoramaError::TextureDecode(format!(
            "expected {} bytes for {}x{} {}, got {}",
            expected,
            frame.width,
            frame.height,
            frame.format,
            frame.data.len()
        )));
    }

    let data = frame.data.clone();
    let img = if channels == 3 {
        RgbImage::from_raw(frame.width, frame.height, data)
    } else {
        RgbaImage::from_raw(frame.width, frame.height, data)
            .map(|rgba| DynamicImage::ImageRgba8(rgba).to_rgb8())
    };
    img.ok_or_else(|| {
        PanoramaError::TextureDecode(format!(
            "could not wrap {}x{} {} buffer",
            frame.width, frame.height, frame.format
        ))
    })
}
