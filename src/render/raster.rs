use std::borrow::Cow;

use crate::foundation::core::{Canvas, PixelRect};
use crate::foundation::error::{GifloomError, GifloomResult};
use crate::foundation::math::{premul_channel, unpremul_channel};

/// Resampling filter used whenever a raster changes size.
///
/// `Bilinear` is the default everywhere (canvas fit, layer scale, output resize). `Nearest`
/// keeps hard pixel edges and is the better choice for pixel-art sprite sheets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resample {
    Nearest,
    #[default]
    Bilinear,
}

impl Resample {
    fn filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Bilinear => image::imageops::FilterType::Triangle,
        }
    }
}

/// Owned RGBA8 pixel buffer with **premultiplied** alpha, row-major and tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap premultiplied RGBA8 bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> GifloomResult<Self> {
        Canvas::new(width, height)?;
        let expected = Canvas { width, height }.rgba_len();
        if data.len() != expected {
            return Err(GifloomError::invalid_input(format!(
                "raster {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap straight (non-premultiplied) RGBA8 bytes, premultiplying in place.
    pub fn from_straight_rgba(width: u32, height: u32, mut data: Vec<u8>) -> GifloomResult<Self> {
        premultiply_in_place(&mut data);
        Self::new(width, height, data)
    }

    /// Fully transparent raster of the given size.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
        }
    }

    /// Raster filled with one straight RGBA colour.
    pub fn filled(canvas: Canvas, straight_rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = straight_rgba;
        let px = [
            premul_channel(r, a),
            premul_channel(g, a),
            premul_channel(b, a),
            a,
        ];
        let mut data = Vec::with_capacity(canvas.rgba_len());
        for _ in 0..canvas.pixel_count() {
            data.extend_from_slice(&px);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Premultiplied pixel at `(x, y)`, `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Copy out as straight-alpha RGBA8 (the layout PNG and GIF encoders expect).
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 255 {
                continue;
            }
            px[0] = unpremul_channel(px[0], a);
            px[1] = unpremul_channel(px[1], a);
            px[2] = unpremul_channel(px[2], a);
        }
        out
    }

    /// Extract the part of `rect` that lies inside the raster.
    pub fn crop(&self, rect: PixelRect) -> Option<Raster> {
        let rect = rect.clip_to(self.width, self.height)?;
        let row_bytes = rect.width as usize * 4;
        let mut data = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = ((y as usize) * (self.width as usize) + rect.x as usize) * 4;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Some(Raster {
            width: rect.width,
            height: rect.height,
            data,
        })
    }

    /// Resize to `target`, borrowing `self` unchanged when the size already matches.
    ///
    /// Filtering runs on premultiplied data so transparent neighbours do not bleed colour.
    pub fn resized(&self, target: Canvas, resample: Resample) -> GifloomResult<Cow<'_, Raster>> {
        if target == self.size() {
            return Ok(Cow::Borrowed(self));
        }
        target.validate()?;
        let src = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| GifloomError::invalid_input("raster buffer does not match its size"))?;
        let out = image::imageops::resize(&src, target.width, target.height, resample.filter());
        Ok(Cow::Owned(Raster {
            width: target.width,
            height: target.height,
            data: out.into_raw(),
        }))
    }
}

pub(crate) fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = premul_channel(px[0], a);
        px[1] = premul_channel(px[1], a);
        px[2] = premul_channel(px[2], a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
