use std::{collections::HashMap, path::Path};

use anyhow::Context;

use crate::{
    assets::store::MaterialId,
    encode::settings::{GifSettings, PaletteSize},
    foundation::core::{Canvas, PixelRect},
    foundation::error::{GifloomError, GifloomResult},
    foundation::fs::write_atomically,
    sequence::model::{Frame, FrameContent, Layer, Sequence},
};

/// Format version written to and required from template files.
pub const TEMPLATE_VERSION: &str = "1";

/// A sequence's structure with material ids replaced by slot numbers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Template {
    pub version: String,
    /// Slots are `0..slot_count`, numbered by first use.
    pub slot_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<TemplateSettings>,
    pub frames: Vec<TemplateFrame>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateFrame {
    pub duration_ms: u32,
    #[serde(flatten)]
    pub content: TemplateContent,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateContent {
    Simple { slot: usize },
    Layered { layers: Vec<TemplateLayer> },
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// Layer geometry with the material replaced by a slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateLayer {
    pub slot: usize,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<PixelRect>,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fit_canvas: bool,
}

/// Export configuration carried inside a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TemplateSettings {
    pub output_size: Canvas,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_size: Option<Canvas>,
    #[serde(default)]
    pub loop_count: u16,
    #[serde(default)]
    pub transparent_background: bool,
    #[serde(default)]
    pub palette_size: PaletteSize,
}

impl TemplateSettings {
    pub fn from_gif_settings(s: &GifSettings) -> Self {
        Self {
            output_size: s.output_size,
            canvas_size: s.canvas_size,
            loop_count: s.loop_count,
            transparent_background: s.transparent_background,
            palette_size: s.palette_size,
        }
    }

    /// Overlay these values onto `base`, keeping everything a template does not carry.
    pub fn apply_to(&self, base: GifSettings) -> GifSettings {
        GifSettings {
            output_size: self.output_size,
            canvas_size: self.canvas_size,
            loop_count: self.loop_count,
            transparent_background: self.transparent_background,
            palette_size: self.palette_size,
            ..base
        }
    }
}

/// Which materials fill a template's slots on import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindMode {
    /// Slot `i` takes the `i`-th available material.
    FirstN,
    /// Slot `i` takes the `i`-th listed id; each must be among the available materials.
    Selected(Vec<MaterialId>),
}

/// Summary for listings.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TemplateInfo {
    pub version: String,
    pub frame_count: usize,
    pub slot_count: usize,
    pub total_layers: usize,
    pub total_duration_ms: u64,
    pub settings: Option<TemplateSettings>,
}

/// Strip material ids from `sequence`, numbering distinct materials in first-seen order.
pub fn export_template(sequence: &Sequence) -> Template {
    let mut slots = HashMap::<MaterialId, usize>::new();
    let mut slot_of = |id: MaterialId| {
        let next = slots.len();
        *slots.entry(id).or_insert(next)
    };

    let frames = sequence
        .frames()
        .iter()
        .map(|frame| TemplateFrame {
            duration_ms: frame.duration_ms(),
            content: match &frame.content {
                FrameContent::Simple { material_id } => TemplateContent::Simple {
                    slot: slot_of(*material_id),
                },
                FrameContent::Layered { layers } => TemplateContent::Layered {
                    layers: layers
                        .iter()
                        .map(|l| TemplateLayer {
                            slot: slot_of(l.material_id),
                            offset_x: l.offset_x,
                            offset_y: l.offset_y,
                            crop: l.crop,
                            scale_x: l.scale_x,
                            scale_y: l.scale_y,
                            opacity: l.opacity,
                            visible: l.visible,
                            fit_canvas: l.fit_canvas,
                        })
                        .collect(),
                },
            },
        })
        .collect();

    Template {
        version: TEMPLATE_VERSION.to_string(),
        slot_count: slots.len(),
        settings: None,
        frames,
    }
}

/// Bind `template`'s slots to concrete materials and rebuild the sequence.
///
/// Fails with [`GifloomError::InsufficientMaterials`] when fewer materials than slots are
/// supplied; materials are never repeated to fill the gap.
#[tracing::instrument(skip_all, fields(slots = template.slot_count, frames = template.frames.len()))]
pub fn import_template(
    template: &Template,
    bind: &BindMode,
    available: &[MaterialId],
) -> GifloomResult<Sequence> {
    template.validate()?;

    let bound: &[MaterialId] = match bind {
        BindMode::FirstN => available,
        BindMode::Selected(ids) => {
            if let Some(missing) = ids.iter().find(|id| !available.contains(id)) {
                return Err(GifloomError::not_found(format!(
                    "selected {missing} is not among the available materials"
                )));
            }
            ids
        }
    };
    if bound.len() < template.slot_count {
        return Err(GifloomError::InsufficientMaterials {
            required: template.slot_count,
            available: bound.len(),
        });
    }

    let frames = template
        .frames
        .iter()
        .map(|tf| {
            let content = match &tf.content {
                TemplateContent::Simple { slot } => FrameContent::Simple {
                    material_id: bound[*slot],
                },
                TemplateContent::Layered { layers } => FrameContent::Layered {
                    layers: layers
                        .iter()
                        .map(|tl| Layer {
                            material_id: bound[tl.slot],
                            offset_x: tl.offset_x,
                            offset_y: tl.offset_y,
                            crop: tl.crop,
                            scale_x: tl.scale_x,
                            scale_y: tl.scale_y,
                            opacity: tl.opacity,
                            visible: tl.visible,
                            fit_canvas: tl.fit_canvas,
                        })
                        .collect(),
                },
            };
            Frame::new(content, tf.duration_ms)
        })
        .collect::<GifloomResult<Vec<_>>>()?;
    Ok(Sequence::from_frames(frames))
}

impl Template {
    pub fn with_settings(mut self, settings: TemplateSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Check version, slot bounds and per-frame numeric invariants.
    pub fn validate(&self) -> GifloomResult<()> {
        if self.version != TEMPLATE_VERSION {
            return Err(GifloomError::serde(format!(
                "unsupported template version {:?} (expected {TEMPLATE_VERSION:?})",
                self.version
            )));
        }
        for (i, frame) in self.frames.iter().enumerate() {
            if frame.duration_ms == 0 {
                return Err(GifloomError::invalid_input(format!(
                    "template frame {i} has zero duration"
                )));
            }
            let slots: Vec<usize> = match &frame.content {
                TemplateContent::Simple { slot } => vec![*slot],
                TemplateContent::Layered { layers } => layers.iter().map(|l| l.slot).collect(),
            };
            if let Some(bad) = slots.into_iter().find(|&s| s >= self.slot_count) {
                return Err(GifloomError::invalid_input(format!(
                    "template frame {i} uses slot {bad} but only {} are declared",
                    self.slot_count
                )));
            }
        }
        if let Some(s) = &self.settings {
            s.apply_to(GifSettings::default()).validate()?;
        }
        Ok(())
    }

    pub fn info(&self) -> TemplateInfo {
        TemplateInfo {
            version: self.version.clone(),
            frame_count: self.frames.len(),
            slot_count: self.slot_count,
            total_layers: self
                .frames
                .iter()
                .map(|f| match &f.content {
                    TemplateContent::Simple { .. } => 1,
                    TemplateContent::Layered { layers } => layers.len(),
                })
                .sum(),
            total_duration_ms: self.frames.iter().map(|f| u64::from(f.duration_ms)).sum(),
            settings: self.settings,
        }
    }

    pub fn to_json_string(&self) -> GifloomResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GifloomError::serde(format!("serialize template: {e}")))
    }

    pub fn from_json_str(s: &str) -> GifloomResult<Self> {
        let template: Self = serde_json::from_str(s)
            .map_err(|e| GifloomError::serde(format!("parse template: {e}")))?;
        template.validate()?;
        Ok(template)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> GifloomResult<()> {
        write_atomically(path.as_ref(), self.to_json_string()?.as_bytes())
    }

    pub fn load(path: impl AsRef<Path>) -> GifloomResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read template {}", path.display()))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/codec.rs"]
mod tests;
