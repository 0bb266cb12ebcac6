//! Inter-frame diffing on palette-indexed buffers.

use crate::foundation::core::{Canvas, PixelRect};

/// What the decoder does with a frame's area before drawing the next one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposal {
    /// Leave the pixels in place.
    Keep,
    /// Clear the frame's area to transparent.
    Background,
}

/// How one frame is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    /// Area written, in canvas coordinates.
    pub rect: PixelRect,
    /// Whole canvas, every pixel explicit.
    pub full: bool,
    pub dispose: Disposal,
}

/// Bounding box of the pixels that differ between two same-size index buffers.
pub fn changed_rect(prev: &[u8], cur: &[u8], width: u32) -> Option<PixelRect> {
    let w = width as usize;
    if w == 0 || prev.len() != cur.len() {
        return None;
    }
    let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0usize, 0usize);
    for (y, (pr, cr)) in prev.chunks_exact(w).zip(cur.chunks_exact(w)).enumerate() {
        if pr == cr {
            continue;
        }
        let Some(first) = pr.iter().zip(cr).position(|(a, b)| a != b) else {
            continue;
        };
        let from_end = pr
            .iter()
            .rev()
            .zip(cr.iter().rev())
            .position(|(a, b)| a != b)
            .unwrap_or(w - 1 - first);
        let last = w - 1 - from_end;
        x0 = x0.min(first);
        x1 = x1.max(last);
        y0 = y0.min(y);
        y1 = y;
    }
    (x0 != usize::MAX).then(|| {
        PixelRect::new(
            x0 as u32,
            y0 as u32,
            (x1 - x0 + 1) as u32,
            (y1 - y0 + 1) as u32,
        )
    })
}

/// Whether some pixel goes from drawn to transparent, which `Keep` disposal cannot express.
pub fn needs_clear(prev: &[u8], cur: &[u8], transparent: u8) -> bool {
    prev.iter()
        .zip(cur)
        .any(|(&p, &c)| p != transparent && c == transparent)
}

/// Decide rect, fullness and disposal for every frame of a looping animation.
///
/// A frame is written in full when it is the first, when it or its successor (wrapping around)
/// needs a cleared canvas, or when its changed area exceeds `diff_threshold` of the canvas.
/// Unchanged frames shrink to a single pixel.
pub fn plan_frames(
    frames: &[Vec<u8>],
    canvas: Canvas,
    transparent: Option<u8>,
    diff_threshold: f32,
) -> Vec<FramePlan> {
    let n = frames.len();
    let clear: Vec<bool> = (0..n)
        .map(|i| match transparent {
            Some(t) if n > 1 => needs_clear(&frames[(i + n - 1) % n], &frames[i], t),
            _ => false,
        })
        .collect();

    let full_rect = canvas.full_rect();
    let limit = f64::from(diff_threshold) * canvas.pixel_count() as f64;
    (0..n)
        .map(|i| {
            let clear_next = clear[(i + 1) % n] && n > 1;
            let dispose = if clear_next {
                Disposal::Background
            } else {
                Disposal::Keep
            };
            if i == 0 || clear[i] || clear_next {
                return FramePlan {
                    rect: full_rect,
                    full: true,
                    dispose,
                };
            }
            match changed_rect(&frames[i - 1], &frames[i], canvas.width) {
                Some(rect) if rect.area() as f64 > limit => FramePlan {
                    rect: full_rect,
                    full: true,
                    dispose,
                },
                Some(rect) => FramePlan {
                    rect,
                    full: false,
                    dispose,
                },
                None => FramePlan {
                    rect: PixelRect::new(0, 0, 1, 1),
                    full: false,
                    dispose,
                },
            }
        })
        .collect()
}

/// Index buffer for `plan.rect`. Delta pixels equal to `prev` become `transparent` when one
/// exists, so the decoder keeps what is already on screen.
pub fn frame_pixels(
    plan: &FramePlan,
    cur: &[u8],
    prev: Option<&[u8]>,
    width: u32,
    transparent: Option<u8>,
) -> Vec<u8> {
    let r = plan.rect;
    let w = width as usize;
    let mut out = Vec::with_capacity(r.area() as usize);
    for y in r.y as usize..(r.y + r.height) as usize {
        let row = y * w;
        for x in r.x as usize..(r.x + r.width) as usize {
            let i = row + x;
            let c = cur[i];
            let keep = !plan.full && prev.is_some_and(|p| p[i] == c);
            out.push(match transparent {
                Some(t) if keep => t,
                _ => c,
            });
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/diff.rs"]
mod tests;
