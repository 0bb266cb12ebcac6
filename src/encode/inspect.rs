use std::io::Cursor;

use crate::foundation::error::{GifloomError, GifloomResult};

/// Summary of an encoded GIF.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GifInfo {
    pub width: u16,
    pub height: u16,
    pub frame_count: usize,
    /// Per-frame delays as stored, in centiseconds.
    pub delays_cs: Vec<u16>,
    /// Netscape loop count with `0` meaning forever; `None` when the file has no loop extension.
    pub loop_count: Option<u16>,
    /// Some frame declares a transparent palette index.
    pub has_transparency: bool,
    pub global_palette_len: usize,
}

impl GifInfo {
    pub fn total_duration_ms(&self) -> u64 {
        self.delays_cs.iter().map(|&d| u64::from(d) * 10).sum()
    }
}

/// Read header, loop extension and frame metadata without compositing.
pub fn inspect_gif(bytes: &[u8]) -> GifloomResult<GifInfo> {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = opts
        .read_info(Cursor::new(bytes))
        .map_err(|e| GifloomError::decode(format!("read gif header: {e}")))?;

    let mut delays_cs = Vec::new();
    let mut has_transparency = false;
    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| GifloomError::decode(format!("gif frame {}: {e}", delays_cs.len())))?
    {
        delays_cs.push(frame.delay);
        has_transparency |= frame.transparent.is_some();
    }

    // The loop extension may follow the first frame, so read it after the scan.
    let loop_count = match decoder.repeat() {
        gif::Repeat::Infinite => Some(0),
        gif::Repeat::Finite(0) => None,
        gif::Repeat::Finite(n) => Some(n),
    };

    Ok(GifInfo {
        width: decoder.width(),
        height: decoder.height(),
        frame_count: delays_cs.len(),
        delays_cs,
        loop_count,
        has_transparency,
        global_palette_len: decoder.global_palette().map_or(0, |p| p.len() / 3),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/inspect.rs"]
mod tests;
