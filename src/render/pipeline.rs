use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rayon::prelude::*;

use crate::{
    assets::store::MaterialStore,
    foundation::core::Canvas,
    foundation::error::{GifloomError, GifloomResult},
    render::compositor::{ComposeOpts, Composed, compose_frame_lenient},
    render::raster::Raster,
    sequence::model::{Frame, Sequence},
};

/// How sequence rendering is spread over threads.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    pub parallel: bool,
    /// Frames per batch; cancellation is checked between batches.
    pub chunk_size: usize,
    /// Worker count for the dedicated pool, `None` for rayon's default.
    pub threads: Option<usize>,
    /// Render frames with identical content once and clone the pixels.
    pub static_frame_elision: bool,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_size: 16,
            threads: None,
            static_frame_elision: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub frames_rendered: u64,
    pub frames_elided: u64,
    /// Frames replaced by a transparent canvas because their material was removed.
    pub frames_substituted: u64,
}

/// Cooperative cancellation flag, checked at frame-batch boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(token: Option<&Self>) -> GifloomResult<()> {
        match token {
            Some(t) if t.is_cancelled() => Err(GifloomError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// One rendered timeline position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFrame {
    pub raster: Raster,
    pub duration_ms: u32,
    pub substituted: bool,
}

/// Render the frame at `index` the same way export does.
pub fn render_preview(
    sequence: &Sequence,
    store: &MaterialStore,
    index: usize,
    canvas: Canvas,
    opts: &ComposeOpts,
) -> GifloomResult<Raster> {
    let frame = sequence.get(index)?;
    Ok(compose_frame_lenient(frame, store, canvas, opts)?.raster)
}

/// Render every frame of `sequence`, in order.
///
/// Frames within a batch may render concurrently; output order always matches the sequence.
#[tracing::instrument(skip_all, fields(frames = sequence.len(), canvas = ?canvas))]
pub fn render_sequence(
    sequence: &Sequence,
    store: &MaterialStore,
    canvas: Canvas,
    opts: &ComposeOpts,
    threading: &RenderThreading,
    cancel: Option<&CancelToken>,
) -> GifloomResult<(Vec<RenderedFrame>, RenderStats)> {
    canvas.validate()?;
    let frames = sequence.frames();
    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };

    let chunk_size = threading.chunk_size.max(1);
    let mut out = Vec::with_capacity(frames.len());
    let mut stats = RenderStats::default();
    for chunk in frames.chunks(chunk_size) {
        CancelToken::check(cancel)?;
        let (rendered, chunk_stats) =
            render_chunk(chunk, store, canvas, opts, threading, pool.as_ref())?;
        out.extend(rendered);
        stats.frames_total += chunk_stats.frames_total;
        stats.frames_rendered += chunk_stats.frames_rendered;
        stats.frames_elided += chunk_stats.frames_elided;
        stats.frames_substituted += chunk_stats.frames_substituted;
    }
    CancelToken::check(cancel)?;

    if stats.frames_substituted > 0 {
        tracing::warn!(
            substituted = stats.frames_substituted,
            "frames with removed materials rendered transparent"
        );
    }
    Ok((out, stats))
}

fn render_chunk(
    chunk: &[Frame],
    store: &MaterialStore,
    canvas: Canvas,
    opts: &ComposeOpts,
    threading: &RenderThreading,
    pool: Option<&rayon::ThreadPool>,
) -> GifloomResult<(Vec<RenderedFrame>, RenderStats)> {
    let mut unique = Vec::<usize>::with_capacity(chunk.len());
    let mut frame_to_unique = Vec::<usize>::with_capacity(chunk.len());
    for (idx, frame) in chunk.iter().enumerate() {
        let existing = threading
            .static_frame_elision
            .then(|| {
                unique
                    .iter()
                    .position(|&u| chunk[u].content == frame.content)
            })
            .flatten();
        match existing {
            Some(slot) => frame_to_unique.push(slot),
            None => {
                frame_to_unique.push(unique.len());
                unique.push(idx);
            }
        }
    }

    let compose = |&idx: &usize| compose_frame_lenient(&chunk[idx], store, canvas, opts);
    let composed = match pool {
        Some(pool) => pool.install(|| unique.par_iter().map(compose).collect::<Vec<_>>()),
        None => unique.iter().map(compose).collect::<Vec<_>>(),
    }
    .into_iter()
    .collect::<GifloomResult<Vec<Composed>>>()?;

    let mut stats = RenderStats {
        frames_total: chunk.len() as u64,
        frames_rendered: unique.len() as u64,
        frames_elided: (chunk.len() - unique.len()) as u64,
        frames_substituted: 0,
    };
    let out = chunk
        .iter()
        .zip(frame_to_unique)
        .map(|(frame, u)| {
            let c = &composed[u];
            if c.substituted {
                stats.frames_substituted += 1;
            }
            RenderedFrame {
                raster: c.raster.clone(),
                duration_ms: frame.duration_ms(),
                substituted: c.substituted,
            }
        })
        .collect();
    Ok((out, stats))
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> GifloomResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(GifloomError::invalid_input(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
