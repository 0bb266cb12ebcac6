use crate::foundation::error::{GifloomError, GifloomResult};
use crate::foundation::math::{mul_div255_u16, mul_div255_u8, unit_to_u8, unpremul_channel};
use crate::render::raster::Raster;

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels, with `src` weighted by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = unit_to_u8(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }

    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Blend `src` onto `dst` with its top-left corner at `(x, y)`.
///
/// Parts of `src` falling outside `dst` are clipped; offsets may be negative.
pub fn over_at(dst: &mut Raster, src: &Raster, x: i64, y: i64, opacity: f32) {
    let dw = i64::from(dst.width());
    let dh = i64::from(dst.height());
    let sw = i64::from(src.width());
    let sh = i64::from(src.height());

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(dw);
    let y1 = (y + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let dst_stride = dw as usize * 4;
    let src_stride = sw as usize * 4;
    let src_data = src.data();
    let dst_data = dst.data_mut();

    for dy in y0..y1 {
        let sy = dy - y;
        let d_row = dy as usize * dst_stride;
        let s_row = sy as usize * src_stride;
        for dx in x0..x1 {
            let sx = dx - x;
            let di = d_row + dx as usize * 4;
            let si = s_row + sx as usize * 4;
            let s = [
                src_data[si],
                src_data[si + 1],
                src_data[si + 2],
                src_data[si + 3],
            ];
            let d = [
                dst_data[di],
                dst_data[di + 1],
                dst_data[di + 2],
                dst_data[di + 3],
            ];
            dst_data[di..di + 4].copy_from_slice(&over(d, s, opacity));
        }
    }
}

/// Flatten premultiplied pixels over an opaque background (straight RGBA8, alpha ignored).
///
/// Output pixels are premultiplied and fully opaque.
pub fn flatten_over_bg(dst: &mut [u8], src_premul: &[u8], bg_rgba: [u8; 4]) -> GifloomResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(GifloomError::invalid_input(
            "flatten_over_bg expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Key colour removal: pixels whose RGB is within `threshold` of `rgb` on every channel
/// become fully transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChromaKey {
    pub rgb: [u8; 3],
    #[serde(default = "ChromaKey::default_threshold")]
    pub threshold: u8,
}

impl ChromaKey {
    pub const DEFAULT_THRESHOLD: u8 = 30;

    pub fn new(rgb: [u8; 3]) -> Self {
        Self {
            rgb,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    fn default_threshold() -> u8 {
        Self::DEFAULT_THRESHOLD
    }

    fn matches(self, straight: [u8; 3]) -> bool {
        straight
            .iter()
            .zip(self.rgb.iter())
            .all(|(&c, &k)| c.abs_diff(k) <= self.threshold)
    }

    /// Apply to a premultiplied raster. Colour comparison uses straight RGB.
    pub fn apply(self, raster: &Raster) -> Raster {
        let mut out = raster.clone();
        for px in out.data_mut().chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 {
                continue;
            }
            let straight = [
                unpremul_channel(px[0], a),
                unpremul_channel(px[1], a),
                unpremul_channel(px[2], a),
            ];
            if self.matches(straight) {
                px.copy_from_slice(&[0, 0, 0, 0]);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
