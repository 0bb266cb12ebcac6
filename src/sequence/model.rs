use crate::{
    assets::store::{MaterialId, MaterialStore},
    foundation::core::PixelRect,
    foundation::error::{GifloomError, GifloomResult},
};

/// Default frame duration, matching common GIF tooling (10 fps).
pub const DEFAULT_DURATION_MS: u32 = 100;

/// A positioned, cropped, scaled and opacity-weighted reference to a material.
///
/// The layer's z-order is its position in the owning frame's layer list (index 0 is the bottom).
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub material_id: MaterialId,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Region of the material to use, in the material's pixel space. `None` means all of it.
    pub crop: Option<PixelRect>,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
    pub visible: bool,
    /// Size the layer from the canvas instead of the material, as a simple frame does.
    pub fit_canvas: bool,
}

impl Layer {
    /// Full material, full opacity, at the origin.
    pub fn new(material_id: MaterialId) -> Self {
        Self {
            material_id,
            offset_x: 0,
            offset_y: 0,
            crop: None,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
            fit_canvas: false,
        }
    }

    /// Full material stretched over the whole canvas; renders exactly like a simple frame.
    pub fn fitted(material_id: MaterialId) -> Self {
        Self {
            fit_canvas: true,
            ..Self::new(material_id)
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_crop(mut self, crop: PixelRect) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale_x = sx;
        self.scale_y = sy;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Check numeric invariants: positive finite scales, opacity in `[0, 1]`, non-empty crop.
    pub fn validate(&self) -> GifloomResult<()> {
        for (axis, s) in [("scale_x", self.scale_x), ("scale_y", self.scale_y)] {
            if !s.is_finite() || s <= 0.0 {
                return Err(GifloomError::invalid_input(format!(
                    "layer {axis} must be finite and > 0, got {s}"
                )));
            }
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(GifloomError::invalid_input(format!(
                "layer opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        if let Some(crop) = self.crop
            && crop.is_empty()
        {
            return Err(GifloomError::invalid_input("layer crop must be non-empty"));
        }
        Ok(())
    }
}

/// What a frame draws.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameContent {
    /// One material fitted to the canvas.
    Simple { material_id: MaterialId },
    /// A bottom-to-top layer stack.
    Layered { layers: Vec<Layer> },
}

/// One timeline position: content plus a positive duration.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub content: FrameContent,
    duration_ms: u32,
}

pub(crate) fn check_duration(duration_ms: u32) -> GifloomResult<()> {
    if duration_ms == 0 {
        return Err(GifloomError::invalid_input("frame duration must be > 0 ms"));
    }
    Ok(())
}

impl Frame {
    pub fn new(content: FrameContent, duration_ms: u32) -> GifloomResult<Self> {
        check_duration(duration_ms)?;
        if let FrameContent::Layered { layers } = &content {
            for layer in layers {
                layer.validate()?;
            }
        }
        Ok(Self {
            content,
            duration_ms,
        })
    }

    pub fn simple(material_id: MaterialId, duration_ms: u32) -> GifloomResult<Self> {
        Self::new(FrameContent::Simple { material_id }, duration_ms)
    }

    pub fn layered(layers: Vec<Layer>, duration_ms: u32) -> GifloomResult<Self> {
        Self::new(FrameContent::Layered { layers }, duration_ms)
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn set_duration_ms(&mut self, duration_ms: u32) -> GifloomResult<()> {
        check_duration(duration_ms)?;
        self.duration_ms = duration_ms;
        Ok(())
    }

    /// Number of layers as seen by layer edits; a simple frame counts as one.
    pub fn layer_count(&self) -> usize {
        match &self.content {
            FrameContent::Simple { .. } => 1,
            FrameContent::Layered { layers } => layers.len(),
        }
    }

    /// Materials referenced by this frame, bottom to top.
    pub fn material_ids(&self) -> Vec<MaterialId> {
        match &self.content {
            FrameContent::Simple { material_id } => vec![*material_id],
            FrameContent::Layered { layers } => layers.iter().map(|l| l.material_id).collect(),
        }
    }

    /// Promote a simple frame to a one-layer stack so it can be edited layer-wise.
    ///
    /// The promoted layer is [`Layer::fitted`], so the base keeps rendering as before.
    fn layers_mut(&mut self) -> &mut Vec<Layer> {
        if let FrameContent::Simple { material_id } = self.content {
            self.content = FrameContent::Layered {
                layers: vec![Layer::fitted(material_id)],
            };
        }
        match &mut self.content {
            FrameContent::Layered { layers } => layers,
            FrameContent::Simple { .. } => unreachable!("promoted above"),
        }
    }

    /// Add a layer on top.
    pub fn push_layer(&mut self, layer: Layer) -> GifloomResult<()> {
        layer.validate()?;
        self.layers_mut().push(layer);
        Ok(())
    }

    /// Insert a layer at `index` (`0` is the bottom, `layer_count()` the top).
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> GifloomResult<()> {
        layer.validate()?;
        let len = self.layer_count();
        if index > len {
            return Err(GifloomError::index_out_of_range(index, len));
        }
        self.layers_mut().insert(index, layer);
        Ok(())
    }

    pub fn remove_layer(&mut self, index: usize) -> GifloomResult<Layer> {
        let len = self.layer_count();
        if index >= len {
            return Err(GifloomError::index_out_of_range(index, len));
        }
        Ok(self.layers_mut().remove(index))
    }

    /// Move the layer at `from` so that it ends up at index `to`.
    pub fn move_layer(&mut self, from: usize, to: usize) -> GifloomResult<()> {
        let len = self.layer_count();
        for i in [from, to] {
            if i >= len {
                return Err(GifloomError::index_out_of_range(i, len));
            }
        }
        let layers = self.layers_mut();
        let layer = layers.remove(from);
        layers.insert(to, layer);
        Ok(())
    }
}

/// A reference into a removed material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DanglingRef {
    pub frame_index: usize,
    /// `None` for simple frames.
    pub layer_index: Option<usize>,
    pub material_id: MaterialId,
}

/// The ordered, index-addressed timeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    pub(crate) frames: Vec<Frame>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// One simple frame per id, all with the same duration.
    pub fn from_pattern(ids: &[MaterialId], duration_ms: u32) -> GifloomResult<Self> {
        check_duration(duration_ms)?;
        Ok(Self {
            frames: ids
                .iter()
                .map(|&material_id| Frame {
                    content: FrameContent::Simple { material_id },
                    duration_ms,
                })
                .collect(),
        })
    }

    /// One simple frame per `(id, duration)` pair, e.g. from [`MaterialStore::load_gif`].
    pub fn from_timed(pairs: impl IntoIterator<Item = (MaterialId, u32)>) -> GifloomResult<Self> {
        let frames = pairs
            .into_iter()
            .map(|(id, ms)| Frame::simple(id, ms))
            .collect::<GifloomResult<Vec<_>>>()?;
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> GifloomResult<&Frame> {
        self.frames
            .get(index)
            .ok_or_else(|| GifloomError::index_out_of_range(index, self.frames.len()))
    }

    /// Mutable access for in-frame layer edits. Frame-level invariants are kept by [`Frame`].
    pub fn get_mut(&mut self, index: usize) -> GifloomResult<&mut Frame> {
        let len = self.frames.len();
        self.frames
            .get_mut(index)
            .ok_or_else(|| GifloomError::index_out_of_range(index, len))
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }

    /// Every reference to a material that `store` no longer holds.
    pub fn dangling_references(&self, store: &MaterialStore) -> Vec<DanglingRef> {
        let mut out = Vec::new();
        for (frame_index, frame) in self.frames.iter().enumerate() {
            match &frame.content {
                FrameContent::Simple { material_id } => {
                    if !store.contains(*material_id) {
                        out.push(DanglingRef {
                            frame_index,
                            layer_index: None,
                            material_id: *material_id,
                        });
                    }
                }
                FrameContent::Layered { layers } => {
                    for (layer_index, layer) in layers.iter().enumerate() {
                        if !store.contains(layer.material_id) {
                            out.push(DanglingRef {
                                frame_index,
                                layer_index: Some(layer_index),
                                material_id: layer.material_id,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    /// Point every reference to `old` at `new`. Returns how many references changed.
    pub fn replace_material(&mut self, old: MaterialId, new: MaterialId) -> usize {
        let mut n = 0;
        for frame in &mut self.frames {
            match &mut frame.content {
                FrameContent::Simple { material_id } => {
                    if *material_id == old {
                        *material_id = new;
                        n += 1;
                    }
                }
                FrameContent::Layered { layers } => {
                    for layer in layers.iter_mut().filter(|l| l.material_id == old) {
                        layer.material_id = new;
                        n += 1;
                    }
                }
            }
        }
        n
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/model.rs"]
mod tests;
