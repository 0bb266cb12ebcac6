//! Global palette construction.
//!
//! One palette is built from the union of every frame so colours stay put across frames. When the
//! animation uses no more distinct colours than the palette holds, those colours are used
//! verbatim; otherwise NeuQuant reduces a bounded, evenly spaced sample of all frames.

use std::collections::{BTreeSet, HashMap};

use color_quant::NeuQuant;

use crate::encode::settings::PaletteSize;

/// NeuQuant sampling factor (1 is best quality, 30 fastest).
const NEUQUANT_SAMPLEFAC: i32 = 10;
/// Upper bound on pixels handed to NeuQuant.
const MAX_SAMPLE_PIXELS: usize = 1 << 20;

enum Lookup {
    Exact(HashMap<[u8; 3], u8>),
    Learned(NeuQuant),
}

/// Opaque colours plus an optional trailing transparent slot.
pub struct Palette {
    colors: Vec<[u8; 3]>,
    transparent_index: Option<u8>,
    lookup: Lookup,
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("colors", &self.colors.len())
            .field("transparent_index", &self.transparent_index)
            .field("exact", &matches!(self.lookup, Lookup::Exact(_)))
            .finish()
    }
}

impl Palette {
    /// Build from straight RGBA frames whose alpha is either 0 or 255.
    ///
    /// With `transparent` set, the last slot is reserved and alpha-0 pixels do not take part in
    /// colour selection.
    pub fn build(frames: &[Vec<u8>], size: PaletteSize, transparent: bool) -> Self {
        let capacity = size.colors() - usize::from(transparent);

        let mut distinct = BTreeSet::new();
        let mut overflow = false;
        'scan: for frame in frames {
            for px in frame.chunks_exact(4) {
                if px[3] == 0 && transparent {
                    continue;
                }
                distinct.insert([px[0], px[1], px[2]]);
                if distinct.len() > capacity {
                    overflow = true;
                    break 'scan;
                }
            }
        }

        let (colors, lookup) = if overflow {
            let samples = sample_pixels(frames, transparent);
            let nq = NeuQuant::new(NEUQUANT_SAMPLEFAC, capacity, &samples);
            let colors = nq
                .color_map_rgb()
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect::<Vec<_>>();
            (colors, Lookup::Learned(nq))
        } else {
            let mut colors: Vec<[u8; 3]> = distinct.into_iter().collect();
            if colors.is_empty() {
                colors.push([0, 0, 0]);
            }
            let map = colors
                .iter()
                .enumerate()
                .map(|(i, c)| (*c, i as u8))
                .collect();
            (colors, Lookup::Exact(map))
        };

        let transparent_index = transparent.then_some(colors.len() as u8);
        Self {
            colors,
            transparent_index,
            lookup,
        }
    }

    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }

    /// Number of entries including the transparent slot.
    pub fn len(&self) -> usize {
        self.colors.len() + usize::from(self.transparent_index.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn opaque_colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// Flat `r,g,b,...` table as written to the GIF global colour table.
    pub fn rgb_table(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * 3);
        for c in &self.colors {
            out.extend_from_slice(c);
        }
        if self.transparent_index.is_some() {
            out.extend_from_slice(&[0, 0, 0]);
        }
        out
    }

    /// Nearest opaque entry for `rgb`.
    pub fn index_of(&self, rgb: [u8; 3]) -> u8 {
        match &self.lookup {
            Lookup::Exact(map) => match map.get(&rgb) {
                Some(&i) => i,
                None => nearest(&self.colors, rgb),
            },
            Lookup::Learned(nq) => nq.index_of(&[rgb[0], rgb[1], rgb[2], 255]) as u8,
        }
    }

    /// Map a straight RGBA frame to palette indices.
    pub fn map_frame(&self, rgba: &[u8]) -> Vec<u8> {
        let mut cache = HashMap::<[u8; 3], u8>::new();
        rgba.chunks_exact(4)
            .map(|px| match self.transparent_index {
                Some(t) if px[3] == 0 => t,
                _ => {
                    let rgb = [px[0], px[1], px[2]];
                    *cache.entry(rgb).or_insert_with(|| self.index_of(rgb))
                }
            })
            .collect()
    }
}

fn nearest(colors: &[[u8; 3]], rgb: [u8; 3]) -> u8 {
    let dist = |c: &[u8; 3]| -> u32 {
        c.iter()
            .zip(rgb.iter())
            .map(|(&a, &b)| {
                let d = i32::from(a) - i32::from(b);
                (d * d) as u32
            })
            .sum()
    };
    colors
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| dist(c))
        .map_or(0, |(i, _)| i as u8)
}

/// Evenly strided RGBA sample across all frames, never empty.
fn sample_pixels(frames: &[Vec<u8>], skip_transparent: bool) -> Vec<u8> {
    let total: usize = frames.iter().map(|f| f.len() / 4).sum();
    let stride = total.div_ceil(MAX_SAMPLE_PIXELS).max(1);
    let mut out = Vec::with_capacity((total / stride + 1) * 4);
    let mut n = 0usize;
    for frame in frames {
        for px in frame.chunks_exact(4) {
            n += 1;
            if (n - 1) % stride != 0 || (skip_transparent && px[3] == 0) {
                continue;
            }
            out.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
    }
    if out.is_empty() {
        out.extend_from_slice(&[0, 0, 0, 255]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/quantize.rs"]
mod tests;
