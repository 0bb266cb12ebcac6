use std::borrow::Cow;

use crate::{
    assets::store::{MaterialStore, Resolved},
    foundation::core::Canvas,
    foundation::error::{GifloomError, GifloomResult},
    render::composite::{ChromaKey, over_at},
    render::raster::{Raster, Resample},
    sequence::model::{Frame, FrameContent, Layer},
};

/// Knobs shared by preview and export so both produce the same pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComposeOpts {
    pub resample: Resample,
    /// Keyed out of every material before it is placed.
    pub chroma_key: Option<ChromaKey>,
}

/// A composed frame plus whether it had to be replaced by a blank canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composed {
    pub raster: Raster,
    pub substituted: bool,
}

/// Flatten one frame to a `canvas`-sized premultiplied raster.
///
/// `Simple` frames are fitted to the canvas with `opts.resample`; a dangling simple frame is an
/// error. `Layered` frames are drawn bottom to top onto a transparent canvas; a dangling layer is
/// skipped. Output depends only on the frame, the store contents and `opts`.
pub fn compose_frame(
    frame: &Frame,
    store: &MaterialStore,
    canvas: Canvas,
    opts: &ComposeOpts,
) -> GifloomResult<Raster> {
    canvas.validate()?;
    match &frame.content {
        FrameContent::Simple { material_id } => match store.resolve(*material_id) {
            Resolved::Found(material) => {
                let keyed = keyed(material.raster(), opts.chroma_key);
                Ok(keyed.resized(canvas, opts.resample)?.into_owned())
            }
            Resolved::Dangling(id) => Err(GifloomError::dangling(format!(
                "simple frame references removed {id}"
            ))),
        },
        FrameContent::Layered { layers } => {
            let mut out = Raster::transparent(canvas);
            for (index, layer) in layers.iter().enumerate() {
                draw_layer(&mut out, index, layer, store, opts)?;
            }
            Ok(out)
        }
    }
}

/// [`compose_frame`], but a frame that fails to render becomes a transparent canvas.
///
/// Preview and export both go through here. Only [`GifloomError::Cancelled`] is passed through.
pub fn compose_frame_lenient(
    frame: &Frame,
    store: &MaterialStore,
    canvas: Canvas,
    opts: &ComposeOpts,
) -> GifloomResult<Composed> {
    match compose_frame(frame, store, canvas, opts) {
        Ok(raster) => Ok(Composed {
            raster,
            substituted: false,
        }),
        Err(GifloomError::Cancelled) => Err(GifloomError::Cancelled),
        Err(e) => {
            tracing::warn!(error = %e, "substituting transparent frame");
            Ok(Composed {
                raster: Raster::transparent(canvas),
                substituted: true,
            })
        }
    }
}

fn keyed(raster: &Raster, key: Option<ChromaKey>) -> Cow<'_, Raster> {
    match key {
        Some(key) => Cow::Owned(key.apply(raster)),
        None => Cow::Borrowed(raster),
    }
}

fn draw_layer(
    out: &mut Raster,
    index: usize,
    layer: &Layer,
    store: &MaterialStore,
    opts: &ComposeOpts,
) -> GifloomResult<()> {
    if !layer.visible || layer.opacity <= 0.0 {
        return Ok(());
    }
    layer.validate()?;

    let material = match store.resolve(layer.material_id) {
        Resolved::Found(m) => m,
        Resolved::Dangling(id) => {
            tracing::warn!(layer = index, %id, "skipping layer with removed material");
            return Ok(());
        }
    };

    let cropped: Cow<'_, Raster> = match layer.crop {
        Some(rect) => match material.raster().crop(rect) {
            Some(r) => Cow::Owned(r),
            None => return Ok(()),
        },
        None => Cow::Borrowed(material.raster()),
    };
    let keyed = match opts.chroma_key {
        Some(key) => Cow::Owned(key.apply(&cropped)),
        None => cropped,
    };

    let base = if layer.fit_canvas {
        (out.width(), out.height())
    } else {
        (keyed.width(), keyed.height())
    };
    let Some((sw, sh)) = scaled_size(base, layer.scale_x, layer.scale_y) else {
        return Ok(());
    };
    let (ox, oy) = (i64::from(layer.offset_x), i64::from(layer.offset_y));

    let budget = 4.0 * (out.data().len().max(keyed.data().len()) / 4) as f64;
    if sw * sh <= budget {
        let target = Canvas {
            width: sw as u32,
            height: sh as u32,
        };
        let placed = keyed.resized(target, opts.resample)?;
        over_at(out, &placed, ox, oy, layer.opacity);
    } else if let Some((part, x, y)) =
        visible_part(&keyed, (sw, sh), ox, oy, out.size(), opts.resample)?
    {
        over_at(out, &part, x, y, layer.opacity);
    }
    Ok(())
}

/// Scaled layer size in whole pixels, `None` when it rounds to nothing.
fn scaled_size((w, h): (u32, u32), sx: f32, sy: f32) -> Option<(f64, f64)> {
    let sw = (f64::from(w) * f64::from(sx)).round();
    let sh = (f64::from(h) * f64::from(sy)).round();
    (sw >= 1.0 && sh >= 1.0 && sw.is_finite() && sh.is_finite()).then_some((sw, sh))
}

/// Resample only the part of `src`, stretched to `size` and placed at `(ox, oy)`, that lands on
/// `canvas`. Returns the part and its canvas position, or `None` when nothing is visible.
fn visible_part(
    src: &Raster,
    (sw, sh): (f64, f64),
    ox: i64,
    oy: i64,
    canvas: Canvas,
    resample: Resample,
) -> GifloomResult<Option<(Raster, i64, i64)>> {
    let clip = |origin: i64, len: f64, limit: u32| {
        let lo = origin.max(0);
        let hi = (origin as f64 + len).min(f64::from(limit)) as i64;
        (lo < hi).then_some((lo, hi))
    };
    let (Some((x0, x1)), Some((y0, y1))) =
        (clip(ox, sw, canvas.width), clip(oy, sh, canvas.height))
    else {
        return Ok(None);
    };

    let fx = f64::from(src.width()) / sw;
    let fy = f64::from(src.height()) / sh;
    let mut data = Vec::with_capacity(((x1 - x0) * (y1 - y0) * 4) as usize);
    for y in y0..y1 {
        let v = ((y - oy) as f64 + 0.5) * fy;
        for x in x0..x1 {
            let u = ((x - ox) as f64 + 0.5) * fx;
            data.extend_from_slice(&sample(src, u, v, resample));
        }
    }
    let part = Raster::new((x1 - x0) as u32, (y1 - y0) as u32, data)?;
    Ok(Some((part, x0, y0)))
}

/// Premultiplied sample at continuous source position `(u, v)`, pixel centres at `n + 0.5`.
fn sample(src: &Raster, u: f64, v: f64, resample: Resample) -> [u8; 4] {
    let (w, h) = (i64::from(src.width()), i64::from(src.height()));
    let texel = |x: i64, y: i64| {
        let i = ((y.clamp(0, h - 1) * w + x.clamp(0, w - 1)) * 4) as usize;
        let d = src.data();
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    };
    match resample {
        Resample::Nearest => texel(u.floor() as i64, v.floor() as i64),
        Resample::Bilinear => {
            let (u, v) = (u - 0.5, v - 0.5);
            let (x0, y0) = (u.floor(), v.floor());
            let (tx, ty) = (u - x0, v - y0);
            let (x0, y0) = (x0 as i64, y0 as i64);
            let (a, b) = (texel(x0, y0), texel(x0 + 1, y0));
            let (c, d) = (texel(x0, y0 + 1), texel(x0 + 1, y0 + 1));
            let mut out = [0u8; 4];
            for i in 0..4 {
                let top = f64::from(a[i]) * (1.0 - tx) + f64::from(b[i]) * tx;
                let bottom = f64::from(c[i]) * (1.0 - tx) + f64::from(d[i]) * tx;
                out[i] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
            }
            out
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
