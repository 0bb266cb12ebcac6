use std::collections::BTreeSet;

use crate::{
    assets::store::{MaterialId, MaterialOrigin, MaterialStore},
    foundation::core::PixelRect,
    foundation::error::{GifloomError, GifloomResult},
    render::raster::Raster,
};

/// How a source image is divided into a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GridSpec {
    /// Fixed number of columns and rows; tile size follows from the image size.
    ByCount { cols: u32, rows: u32 },
    /// Fixed tile size; column/row counts follow from the image size.
    ByTileSize { tile_width: u32, tile_height: u32 },
}

/// Concrete grid derived from a [`GridSpec`] for one image size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl GridLayout {
    pub fn tile_count(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn contains(self, pos: TilePosition) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn tile_rect(self, pos: TilePosition) -> PixelRect {
        PixelRect::new(
            pos.col * self.tile_width,
            pos.row * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    /// Every position in row-major order.
    pub fn positions(self) -> impl Iterator<Item = TilePosition> {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| TilePosition { row, col }))
    }
}

impl GridSpec {
    /// Reject degenerate grids (`0` columns, rows or tile edge).
    pub fn validate(self) -> GifloomResult<()> {
        let ok = match self {
            Self::ByCount { cols, rows } => cols >= 1 && rows >= 1,
            Self::ByTileSize {
                tile_width,
                tile_height,
            } => tile_width >= 1 && tile_height >= 1,
        };
        if !ok {
            return Err(GifloomError::invalid_input(format!(
                "grid must be at least 1x1, got {self:?}"
            )));
        }
        Ok(())
    }

    /// Derive the grid for a `width`x`height` image.
    ///
    /// Remainder pixels on the last row/column are ignored. Returns `None` when the image is too
    /// small for even one tile.
    pub fn layout_for(self, width: u32, height: u32) -> Option<GridLayout> {
        let layout = match self {
            Self::ByCount { cols, rows } => {
                if cols == 0 || rows == 0 {
                    return None;
                }
                GridLayout {
                    cols,
                    rows,
                    tile_width: width / cols,
                    tile_height: height / rows,
                }
            }
            Self::ByTileSize {
                tile_width,
                tile_height,
            } => {
                if tile_width == 0 || tile_height == 0 {
                    return None;
                }
                GridLayout {
                    cols: width / tile_width,
                    rows: height / tile_height,
                    tile_width,
                    tile_height,
                }
            }
        };
        let degenerate = layout.cols == 0
            || layout.rows == 0
            || layout.tile_width == 0
            || layout.tile_height == 0;
        (!degenerate).then_some(layout)
    }
}

/// Grid cell address. Ordering is row-major.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TilePosition {
    pub row: u32,
    pub col: u32,
}

impl TilePosition {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Which grid cells to keep. The same selection applies to every source of a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileSelection {
    #[default]
    All,
    Positions(BTreeSet<TilePosition>),
}

impl TileSelection {
    pub fn positions(positions: impl IntoIterator<Item = TilePosition>) -> Self {
        Self::Positions(positions.into_iter().collect())
    }

    /// Selected positions that exist in `layout`, row-major.
    pub fn resolve(&self, layout: GridLayout) -> Vec<TilePosition> {
        match self {
            Self::All => layout.positions().collect(),
            Self::Positions(set) => set.iter().copied().filter(|p| layout.contains(*p)).collect(),
        }
    }
}

/// One image to split, with the label recorded in tile origins.
#[derive(Clone, Copy, Debug)]
pub struct TileSource<'a> {
    pub name: &'a str,
    pub raster: &'a Raster,
}

/// A source that produced no tiles, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedSource {
    pub source_index: usize,
    pub name: String,
    pub reason: String,
}

/// Result of a batch split: new material ids in output order plus per-source skips.
#[derive(Clone, Debug, Default)]
pub struct SplitOutcome {
    pub materials: Vec<MaterialId>,
    pub skipped: Vec<SkippedSource>,
}

/// Cut one raster into the selected tiles, row-major.
///
/// Returns an empty list when the grid is degenerate for this image size.
pub fn split_raster(
    raster: &Raster,
    spec: GridSpec,
    selection: &TileSelection,
) -> GifloomResult<Vec<(TilePosition, Raster)>> {
    spec.validate()?;
    let Some(layout) = spec.layout_for(raster.width(), raster.height()) else {
        return Ok(Vec::new());
    };
    Ok(selection
        .resolve(layout)
        .into_iter()
        .filter_map(|pos| raster.crop(layout.tile_rect(pos)).map(|tile| (pos, tile)))
        .collect())
}

/// Split every source with the same grid and selection, adding the tiles to `store`.
///
/// Output order is source order, then row-major within each source. A source whose tile size
/// rounds to zero is reported in [`SplitOutcome::skipped`] and does not abort the batch.
/// The grid is validated before any material is added.
#[tracing::instrument(skip(store, sources, selection), fields(sources = sources.len()))]
pub fn split_into_store(
    store: &mut MaterialStore,
    sources: &[TileSource<'_>],
    spec: GridSpec,
    selection: &TileSelection,
) -> GifloomResult<SplitOutcome> {
    spec.validate()?;

    let mut cut = Vec::with_capacity(sources.len());
    let mut outcome = SplitOutcome::default();
    for (source_index, source) in sources.iter().enumerate() {
        let (w, h) = (source.raster.width(), source.raster.height());
        if spec.layout_for(w, h).is_none() {
            let reason = format!("{spec:?} yields an empty tile for a {w}x{h} image");
            tracing::warn!(source = source.name, %reason, "skipping tile source");
            outcome.skipped.push(SkippedSource {
                source_index,
                name: source.name.to_string(),
                reason,
            });
            continue;
        }
        cut.push((source.name, split_raster(source.raster, spec, selection)?));
    }

    for (name, tiles) in cut {
        for (pos, tile) in tiles {
            outcome.materials.push(store.add(
                tile,
                MaterialOrigin::Tile {
                    source: name.to_string(),
                    row: pos.row,
                    col: pos.col,
                },
            ));
        }
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/grid.rs"]
mod tests;
