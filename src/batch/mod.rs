//! One template applied to many sprite sheets.
//!
//! Each source is decoded, split into a scratch [`MaterialStore`], bound to the template with
//! [`BindMode::FirstN`] and exported. A failing source is recorded and the batch moves on.

use std::{collections::HashSet, path::Path};

use crate::{
    assets::decode::decode_image,
    assets::export::{sanitize_file_stem, unique_name},
    assets::store::MaterialStore,
    encode::settings::GifSettings,
    encode::writer::{GifEncodeStats, export_gif_with_stats},
    foundation::error::{GifloomError, GifloomResult},
    foundation::fs::write_atomically,
    render::pipeline::CancelToken,
    template::codec::{BindMode, Template, import_template},
    tiles::grid::{GridSpec, TileSelection, TileSource, split_into_store},
};

/// Shared configuration for every source of a batch.
#[derive(Clone, Debug)]
pub struct BatchJob {
    pub template: Template,
    pub grid: GridSpec,
    pub selection: TileSelection,
    /// Base settings; the template's own settings take precedence where present.
    pub settings: GifSettings,
}

/// One encoded image to process.
#[derive(Clone, Debug)]
pub struct BatchSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct EncodedGif {
    pub bytes: Vec<u8>,
    pub stats: GifEncodeStats,
}

impl EncodedGif {
    /// Write to `path`; nothing appears there unless the whole write succeeds.
    pub fn save(&self, path: impl AsRef<Path>) -> GifloomResult<()> {
        write_atomically(path.as_ref(), &self.bytes)
    }
}

/// Result for one source.
#[derive(Debug)]
pub struct BatchItem {
    pub source_index: usize,
    pub name: String,
    /// Suggested output file name, unique within the batch.
    pub file_name: String,
    pub result: GifloomResult<EncodedGif>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

impl BatchJob {
    pub fn effective_settings(&self) -> GifSettings {
        match &self.template.settings {
            Some(ts) => ts.apply_to(self.settings.clone()),
            None => self.settings.clone(),
        }
    }

    pub fn validate(&self) -> GifloomResult<()> {
        self.template.validate()?;
        self.grid.validate()?;
        self.effective_settings().validate()
    }
}

/// Split, bind and encode a single source.
pub fn process_source(
    job: &BatchJob,
    name: &str,
    bytes: &[u8],
    cancel: Option<&CancelToken>,
) -> GifloomResult<EncodedGif> {
    let raster = decode_image(bytes)?;
    let mut store = MaterialStore::new();
    let split = split_into_store(
        &mut store,
        &[TileSource {
            name,
            raster: &raster,
        }],
        job.grid,
        &job.selection,
    )?;
    if let Some(skip) = split.skipped.first() {
        return Err(GifloomError::invalid_input(skip.reason.clone()));
    }
    if split.materials.is_empty() {
        return Err(GifloomError::invalid_input(
            "tile selection matched no grid positions",
        ));
    }

    let sequence = import_template(&job.template, &BindMode::FirstN, &split.materials)?;
    let (bytes, stats) =
        export_gif_with_stats(&sequence, &store, &job.effective_settings(), cancel)?;
    Ok(EncodedGif { bytes, stats })
}

/// Run `job` over every source in order.
///
/// Per-source failures land in the report. Only an invalid job or cancellation fails the call.
#[tracing::instrument(skip_all, fields(sources = sources.len()))]
pub fn process_batch(
    job: &BatchJob,
    sources: &[BatchSource],
    cancel: Option<&CancelToken>,
) -> GifloomResult<BatchReport> {
    job.validate()?;

    let mut used = HashSet::new();
    let mut report = BatchReport::default();
    for (source_index, source) in sources.iter().enumerate() {
        CancelToken::check(cancel)?;
        let result = process_source(job, &source.name, &source.bytes, cancel);
        if matches!(result, Err(GifloomError::Cancelled)) {
            return Err(GifloomError::Cancelled);
        }
        if let Err(e) = &result {
            tracing::warn!(source = %source.name, error = %e, "batch source failed");
        }
        report.items.push(BatchItem {
            source_index,
            name: source.name.clone(),
            file_name: unique_name(&sanitize_file_stem(&source.name), "gif", &mut used),
            result,
        });
    }
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

/// Number of tiles `grid` and `selection` yield for a `width`x`height` sheet, or
/// [`GifloomError::InsufficientMaterials`] when that is fewer than `template` needs.
pub fn validate_template_for_grid(
    template: &Template,
    grid: GridSpec,
    selection: &TileSelection,
    width: u32,
    height: u32,
) -> GifloomResult<usize> {
    grid.validate()?;
    let tiles = grid
        .layout_for(width, height)
        .map_or(0, |layout| selection.resolve(layout).len());
    if tiles < template.slot_count {
        return Err(GifloomError::InsufficientMaterials {
            required: template.slot_count,
            available: tiles,
        });
    }
    Ok(tiles)
}

#[cfg(test)]
#[path = "../../tests/unit/batch/mod.rs"]
mod tests;
