use std::io::Cursor;

use image::AnimationDecoder as _;

use crate::{
    foundation::error::{GifloomError, GifloomResult},
    render::raster::Raster,
};

/// Delay used when a GIF frame declares none.
pub const DEFAULT_GIF_FRAME_MS: u32 = 100;

/// One fully composited frame of a decoded GIF.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    pub raster: Raster,
    pub duration_ms: u32,
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> GifloomResult<Raster> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| GifloomError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Raster::from_straight_rgba(width, height, rgba.into_raw())
}

/// Decode every frame of a GIF, resolving partial frames and disposal into full canvases.
pub fn decode_gif(bytes: &[u8]) -> GifloomResult<Vec<DecodedFrame>> {
    let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(bytes))
        .map_err(|e| GifloomError::decode(format!("read gif header: {e}")))?;

    let mut out = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame.map_err(|e| {
            GifloomError::decode(format!("decode gif frame {}: {e}", out.len()))
        })?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let ms = if denom == 0 { 0 } else { numer / denom };
        let duration_ms = if ms == 0 { DEFAULT_GIF_FRAME_MS } else { ms };

        let buffer = frame.into_buffer();
        let (width, height) = buffer.dimensions();
        out.push(DecodedFrame {
            raster: Raster::from_straight_rgba(width, height, buffer.into_raw())?,
            duration_ms,
        });
    }

    if out.is_empty() {
        return Err(GifloomError::decode("gif contains no frames"));
    }
    Ok(out)
}

/// Encode a raster as PNG (straight alpha).
pub fn encode_png(raster: &Raster) -> GifloomResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(raster.width(), raster.height(), raster.to_straight_rgba())
        .ok_or_else(|| GifloomError::encode("raster buffer does not match its size"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| GifloomError::encode(format!("encode png: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
