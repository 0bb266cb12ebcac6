use std::{borrow::Cow, path::Path};

use rayon::prelude::*;

use crate::{
    assets::store::MaterialStore,
    encode::diff::{Disposal, frame_pixels, plan_frames},
    encode::quantize::Palette,
    encode::settings::GifSettings,
    foundation::error::{GifloomError, GifloomResult},
    foundation::fs::write_atomically,
    render::composite::flatten_over_bg,
    render::pipeline::{CancelToken, RenderStats, RenderedFrame, build_thread_pool, render_sequence},
    sequence::model::Sequence,
};

/// GIF frame delay in centiseconds: `round(ms / 10)`, at least 1.
pub fn delay_cs(duration_ms: u32) -> u16 {
    let cs = (u64::from(duration_ms) + 5) / 10;
    cs.clamp(1, u64::from(u16::MAX)) as u16
}

/// What an export produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GifEncodeStats {
    pub frames: usize,
    pub full_frames: usize,
    pub delta_frames: usize,
    /// Palette entries, including the transparent slot.
    pub palette_len: usize,
    pub bytes: usize,
    pub render: RenderStats,
}

/// Encode `sequence` as an animated GIF.
pub fn export_gif(
    sequence: &Sequence,
    store: &MaterialStore,
    settings: &GifSettings,
) -> GifloomResult<Vec<u8>> {
    export_gif_with_stats(sequence, store, settings, None).map(|(bytes, _)| bytes)
}

/// Encode `sequence` as an animated GIF, checking `cancel` between frames.
///
/// Pipeline: compose every frame at the canvas size, resize to the output size, build one global
/// palette over all frames, plan sub-rectangles and disposal, then write.
#[tracing::instrument(skip_all, fields(frames = sequence.len()))]
pub fn export_gif_with_stats(
    sequence: &Sequence,
    store: &MaterialStore,
    settings: &GifSettings,
    cancel: Option<&CancelToken>,
) -> GifloomResult<(Vec<u8>, GifEncodeStats)> {
    if sequence.is_empty() {
        return Err(GifloomError::EmptySequence);
    }
    settings.validate()?;

    let (rendered, render_stats) = render_sequence(
        sequence,
        store,
        settings.compose_canvas(),
        &settings.compose_opts(),
        &settings.threading,
        cancel,
    )?;

    let pool = if settings.threading.parallel {
        Some(build_thread_pool(settings.threading.threads)?)
    } else {
        None
    };
    let prepared = prepare_frames(&rendered, settings, pool.as_ref())?;
    CancelToken::check(cancel)?;

    let palette = Palette::build(
        &prepared,
        settings.palette_size,
        settings.transparent_background,
    );
    let indexed: Vec<Vec<u8>> = match &pool {
        Some(pool) => pool.install(|| prepared.par_iter().map(|f| palette.map_frame(f)).collect()),
        None => prepared.iter().map(|f| palette.map_frame(f)).collect(),
    };
    let transparent = palette.transparent_index();
    let out = settings.output_size;
    let plans = plan_frames(&indexed, out, transparent, settings.diff_threshold);

    let mut buf = Vec::new();
    let mut stats = GifEncodeStats {
        frames: rendered.len(),
        palette_len: palette.len(),
        render: render_stats,
        ..GifEncodeStats::default()
    };
    {
        let mut encoder =
            gif::Encoder::new(&mut buf, out.width as u16, out.height as u16, &palette.rgb_table())
                .map_err(|e| GifloomError::encode(format!("gif header: {e}")))?;
        let repeat = match settings.loop_count {
            0 => gif::Repeat::Infinite,
            n => gif::Repeat::Finite(n),
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| GifloomError::encode(format!("gif loop extension: {e}")))?;

        for (i, (plan, frame)) in plans.iter().zip(&rendered).enumerate() {
            CancelToken::check(cancel)?;
            let prev = i.checked_sub(1).map(|p| indexed[p].as_slice());
            let pixels = frame_pixels(plan, &indexed[i], prev, out.width, transparent);
            if plan.full {
                stats.full_frames += 1;
            } else {
                stats.delta_frames += 1;
            }
            let gif_frame = gif::Frame {
                delay: delay_cs(frame.duration_ms),
                dispose: match plan.dispose {
                    Disposal::Keep => gif::DisposalMethod::Keep,
                    Disposal::Background => gif::DisposalMethod::Background,
                },
                transparent,
                left: plan.rect.x as u16,
                top: plan.rect.y as u16,
                width: plan.rect.width as u16,
                height: plan.rect.height as u16,
                buffer: Cow::Owned(pixels),
                ..gif::Frame::default()
            };
            encoder
                .write_frame(&gif_frame)
                .map_err(|e| GifloomError::encode(format!("gif frame {i}: {e}")))?;
        }
        encoder
            .into_inner()
            .map_err(|e| GifloomError::encode(format!("gif trailer: {e}")))?;
    }

    stats.bytes = buf.len();
    tracing::debug!(
        bytes = stats.bytes,
        full = stats.full_frames,
        delta = stats.delta_frames,
        palette = stats.palette_len,
        "gif encoded"
    );
    Ok((buf, stats))
}

/// Encode to `path`. Nothing appears at `path` unless the whole encode succeeds.
#[tracing::instrument(skip_all, fields(dest = %path.as_ref().display()))]
pub fn export_gif_to_file(
    sequence: &Sequence,
    store: &MaterialStore,
    settings: &GifSettings,
    path: impl AsRef<Path>,
    cancel: Option<&CancelToken>,
) -> GifloomResult<GifEncodeStats> {
    let path = path.as_ref();
    let (bytes, stats) = export_gif_with_stats(sequence, store, settings, cancel)?;
    write_atomically(path, &bytes)?;
    Ok(stats)
}

/// Resize to the output size and reduce alpha to {0, 255}, as straight RGBA.
fn prepare_frames(
    frames: &[RenderedFrame],
    settings: &GifSettings,
    pool: Option<&rayon::ThreadPool>,
) -> GifloomResult<Vec<Vec<u8>>> {
    let prepare = |frame: &RenderedFrame| -> GifloomResult<Vec<u8>> {
        let sized = frame
            .raster
            .resized(settings.output_size, settings.resample)?;
        if settings.transparent_background {
            let mut rgba = sized.to_straight_rgba();
            for px in rgba.chunks_exact_mut(4) {
                if px[3] == 0 {
                    px.copy_from_slice(&[0, 0, 0, 0]);
                } else {
                    px[3] = 255;
                }
            }
            Ok(rgba)
        } else {
            let mut flat = vec![0u8; sized.data().len()];
            flatten_over_bg(&mut flat, sized.data(), settings.background_rgba)?;
            Ok(flat)
        }
    };

    match pool {
        Some(pool) => pool.install(|| frames.par_iter().map(prepare).collect()),
        None => frames.iter().map(prepare).collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/writer.rs"]
mod tests;
