use std::path::Path;

use crate::{
    assets::export::export_png,
    assets::store::{LoadedFrame, MaterialId, MaterialStore},
    encode::settings::GifSettings,
    encode::writer::{GifEncodeStats, export_gif, export_gif_to_file},
    foundation::core::Canvas,
    foundation::error::GifloomResult,
    render::compositor::ComposeOpts,
    render::pipeline::{CancelToken, render_preview},
    render::raster::Raster,
    sequence::model::{DanglingRef, Frame, Sequence},
    template::codec::{BindMode, Template, TemplateSettings, export_template, import_template},
    tiles::grid::{GridSpec, SplitOutcome, TileSelection, TileSource, split_into_store},
};

/// The state a UI or CLI session edits: one material library and one timeline.
///
/// Owned and passed explicitly; there is no process-wide instance.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    pub materials: MaterialStore,
    pub sequence: Sequence,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_image(&mut self, name: &str, bytes: &[u8]) -> GifloomResult<MaterialId> {
        self.materials.load_image(name, bytes)
    }

    /// Load every GIF frame as a material and append one simple frame per material, keeping the
    /// file's delays.
    pub fn import_gif(&mut self, name: &str, bytes: &[u8]) -> GifloomResult<Vec<LoadedFrame>> {
        let loaded = self.materials.load_gif(name, bytes)?;
        let timed = Sequence::from_timed(loaded.iter().map(|f| (f.id, f.duration_ms)))?;
        self.sequence.frames.extend(timed.frames);
        Ok(loaded)
    }

    pub fn split(
        &mut self,
        sources: &[TileSource<'_>],
        spec: GridSpec,
        selection: &TileSelection,
    ) -> GifloomResult<SplitOutcome> {
        split_into_store(&mut self.materials, sources, spec, selection)
    }

    /// Append one simple frame per id.
    pub fn append_materials(&mut self, ids: &[MaterialId], duration_ms: u32) -> GifloomResult<()> {
        for &id in ids {
            self.materials.get(id)?;
        }
        let frames = ids
            .iter()
            .map(|&id| Frame::simple(id, duration_ms))
            .collect::<GifloomResult<Vec<_>>>()?;
        self.sequence.frames.extend(frames);
        Ok(())
    }

    /// Remove a material and report the timeline references it leaves dangling.
    ///
    /// The sequence is not touched; dangling layers render transparent until the caller rebinds
    /// them with [`Sequence::replace_material`] or edits them away.
    pub fn remove_material(&mut self, id: MaterialId) -> GifloomResult<Vec<DanglingRef>> {
        self.materials.remove(id)?;
        let dangling: Vec<_> = self
            .sequence
            .dangling_references(&self.materials)
            .into_iter()
            .filter(|r| r.material_id == id)
            .collect();
        if !dangling.is_empty() {
            tracing::warn!(%id, references = dangling.len(), "removed material is still referenced");
        }
        Ok(dangling)
    }

    pub fn preview(&self, index: usize, canvas: Canvas, opts: &ComposeOpts) -> GifloomResult<Raster> {
        render_preview(&self.sequence, &self.materials, index, canvas, opts)
    }

    pub fn export_gif(&self, settings: &GifSettings) -> GifloomResult<Vec<u8>> {
        export_gif(&self.sequence, &self.materials, settings)
    }

    pub fn export_gif_to_file(
        &self,
        settings: &GifSettings,
        path: impl AsRef<Path>,
        cancel: Option<&CancelToken>,
    ) -> GifloomResult<GifEncodeStats> {
        export_gif_to_file(&self.sequence, &self.materials, settings, path, cancel)
    }

    pub fn export_png(&self, ids: &[MaterialId]) -> GifloomResult<Vec<(String, Vec<u8>)>> {
        export_png(&self.materials, ids)
    }

    /// Template of the current timeline, carrying `settings` when given.
    pub fn export_template(&self, settings: Option<&GifSettings>) -> Template {
        let template = export_template(&self.sequence);
        match settings {
            Some(s) => template.with_settings(TemplateSettings::from_gif_settings(s)),
            None => template,
        }
    }

    /// Replace the timeline with `template` bound against the library in insertion order.
    pub fn apply_template(&mut self, template: &Template, bind: &BindMode) -> GifloomResult<()> {
        self.sequence = import_template(template, bind, &self.materials.list())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/workspace.rs"]
mod tests;
