use super::*;
use crate::foundation::core::Canvas;

/// Raster whose red channel encodes x and green channel encodes y.
fn coords(w: u32, h: u32) -> Raster {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[x as u8, y as u8, 0, 255]);
        }
    }
    Raster::new(w, h, data).unwrap()
}

#[test]
fn by_count_4x4_on_128_gives_16_tiles_of_32() {
    let img = coords(128, 128);
    let tiles = split_raster(
        &img,
        GridSpec::ByCount { cols: 4, rows: 4 },
        &TileSelection::All,
    )
    .unwrap();
    assert_eq!(tiles.len(), 16);
    assert!(tiles.iter().all(|(_, t)| t.width() == 32 && t.height() == 32));
    let (pos, tile) = &tiles[5];
    assert_eq!(*pos, TilePosition::new(1, 1));
    assert_eq!(tile.pixel(0, 0), Some([32, 32, 0, 255]));
}

#[test]
fn by_tile_size_ignores_remainder() {
    let layout = GridSpec::ByTileSize {
        tile_width: 16,
        tile_height: 10,
    }
    .layout_for(50, 25)
    .unwrap();
    assert_eq!((layout.cols, layout.rows), (3, 2));
    assert_eq!(layout.tile_count(), 6);
}

#[test]
fn by_count_remainder_is_not_stretched() {
    let layout = GridSpec::ByCount { cols: 3, rows: 1 }
        .layout_for(10, 4)
        .unwrap();
    assert_eq!((layout.tile_width, layout.tile_height), (3, 4));
}

#[test]
fn zero_grid_is_rejected() {
    let img = coords(8, 8);
    let err = split_raster(&img, GridSpec::ByCount { cols: 0, rows: 0 }, &TileSelection::All)
        .unwrap_err();
    assert!(matches!(err, GifloomError::InvalidInput(_)));
    assert!(
        GridSpec::ByTileSize {
            tile_width: 0,
            tile_height: 4
        }
        .validate()
        .is_err()
    );
}

#[test]
fn selection_is_row_major_and_filtered_per_layout() {
    let img = coords(4, 4);
    let sel = TileSelection::positions([
        TilePosition::new(1, 0),
        TilePosition::new(0, 1),
        TilePosition::new(5, 5),
    ]);
    let tiles = split_raster(&img, GridSpec::ByCount { cols: 2, rows: 2 }, &sel).unwrap();
    let order: Vec<_> = tiles.iter().map(|(p, _)| *p).collect();
    assert_eq!(order, vec![TilePosition::new(0, 1), TilePosition::new(1, 0)]);
}

#[test]
fn batch_orders_by_source_then_position_and_reports_skips() {
    let big = coords(8, 8);
    let tiny = coords(2, 2);
    let other = coords(8, 4);
    let sources = [
        TileSource {
            name: "big",
            raster: &big,
        },
        TileSource {
            name: "tiny",
            raster: &tiny,
        },
        TileSource {
            name: "other",
            raster: &other,
        },
    ];
    let sel = TileSelection::positions([TilePosition::new(0, 0), TilePosition::new(0, 1)]);
    let mut store = MaterialStore::new();
    let out = split_into_store(
        &mut store,
        &sources,
        GridSpec::ByTileSize {
            tile_width: 4,
            tile_height: 4,
        },
        &sel,
    )
    .unwrap();

    assert_eq!(out.materials.len(), 4);
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].source_index, 1);
    assert_eq!(out.skipped[0].name, "tiny");

    let origins: Vec<_> = out
        .materials
        .iter()
        .map(|id| store.get(*id).unwrap().origin().display_name())
        .collect();
    assert_eq!(
        origins,
        vec![
            "big_tile_r0_c0",
            "big_tile_r0_c1",
            "other_tile_r0_c0",
            "other_tile_r0_c1"
        ]
    );
}

#[test]
fn invalid_grid_adds_nothing() {
    let img = Raster::transparent(Canvas::new(4, 4).unwrap());
    let mut store = MaterialStore::new();
    let sources = [TileSource {
        name: "x",
        raster: &img,
    }];
    assert!(
        split_into_store(
            &mut store,
            &sources,
            GridSpec::ByCount { cols: 0, rows: 2 },
            &TileSelection::All
        )
        .is_err()
    );
    assert!(store.is_empty());
}
