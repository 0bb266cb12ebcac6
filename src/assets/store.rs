use std::{collections::BTreeMap, sync::Arc};

use crate::{
    assets::decode,
    foundation::error::{GifloomError, GifloomResult},
    render::raster::Raster,
};

/// Stable handle to a material.
///
/// Ids are assigned monotonically by a [`MaterialStore`] and never reused, so a reference to a
/// removed material stays detectable instead of silently aliasing a newer image.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MaterialId(pub(crate) u64);

impl MaterialId {
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Where a material's pixels came from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialOrigin {
    /// A standalone decoded image.
    File { name: String },
    /// One composited frame of a decoded GIF.
    GifFrame { source: String, frame_index: usize },
    /// One cell of a sprite sheet split by the tile splitter.
    Tile {
        source: String,
        row: u32,
        col: u32,
    },
}

impl MaterialOrigin {
    /// Human-readable base name, also used for exported file names.
    pub fn display_name(&self) -> String {
        match self {
            Self::File { name } => name.clone(),
            Self::GifFrame {
                source,
                frame_index,
            } => format!("{source}_frame_{}", frame_index + 1),
            Self::Tile { source, row, col } => format!("{source}_tile_r{row}_c{col}"),
        }
    }
}

/// An immutable decoded image owned by a [`MaterialStore`].
///
/// Pixels sit behind an `Arc`, so cloning a material (or a whole store) to pin it for a
/// background export does not copy pixel data.
#[derive(Clone, Debug)]
pub struct Material {
    id: MaterialId,
    raster: Arc<Raster>,
    origin: MaterialOrigin,
}

impl Material {
    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn origin(&self) -> &MaterialOrigin {
        &self.origin
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// Outcome of looking up a possibly-removed material reference.
#[derive(Clone, Copy, Debug)]
pub enum Resolved<'a> {
    Found(&'a Material),
    Dangling(MaterialId),
}

/// A decoded GIF frame added to the store, with its source delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedFrame {
    pub id: MaterialId,
    pub duration_ms: u32,
}

/// Owner of every material. Insertion order is id order.
#[derive(Clone, Debug, Default)]
pub struct MaterialStore {
    next_id: u64,
    materials: BTreeMap<MaterialId, Material>,
}

impl MaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raster; never touches existing materials.
    pub fn add(&mut self, raster: Raster, origin: MaterialOrigin) -> MaterialId {
        let id = MaterialId(self.next_id);
        self.next_id += 1;
        self.materials.insert(
            id,
            Material {
                id,
                raster: Arc::new(raster),
                origin,
            },
        );
        id
    }

    pub fn get(&self, id: MaterialId) -> GifloomResult<&Material> {
        self.materials
            .get(&id)
            .ok_or_else(|| GifloomError::not_found(id.to_string()))
    }

    /// Like [`MaterialStore::get`], but reports removal as a value instead of an error.
    pub fn resolve(&self, id: MaterialId) -> Resolved<'_> {
        match self.materials.get(&id) {
            Some(m) => Resolved::Found(m),
            None => Resolved::Dangling(id),
        }
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        self.materials.contains_key(&id)
    }

    /// Remove a material. References held by sequences are left for the caller to reconcile.
    pub fn remove(&mut self, id: MaterialId) -> GifloomResult<Material> {
        self.materials
            .remove(&id)
            .ok_or_else(|| GifloomError::not_found(id.to_string()))
    }

    /// Ids in insertion order.
    pub fn list(&self) -> Vec<MaterialId> {
        self.materials.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    /// Drop every material. Ids handed out before stay retired.
    pub fn clear(&mut self) {
        self.materials.clear();
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Decode a still image (PNG, JPEG, GIF first frame, ...) and add it.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn load_image(&mut self, name: &str, bytes: &[u8]) -> GifloomResult<MaterialId> {
        let raster = decode::decode_image(bytes)?;
        Ok(self.add(
            raster,
            MaterialOrigin::File {
                name: name.to_string(),
            },
        ))
    }

    /// Decode every frame of a GIF and add them in file order.
    ///
    /// Decoding completes before anything is added, so a corrupt file leaves the store as-is.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn load_gif(&mut self, name: &str, bytes: &[u8]) -> GifloomResult<Vec<LoadedFrame>> {
        let frames = decode::decode_gif(bytes)?;
        Ok(frames
            .into_iter()
            .enumerate()
            .map(|(frame_index, frame)| LoadedFrame {
                id: self.add(
                    frame.raster,
                    MaterialOrigin::GifFrame {
                        source: name.to_string(),
                        frame_index,
                    },
                ),
                duration_ms: frame.duration_ms,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
