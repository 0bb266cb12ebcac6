use super::*;
use crate::assets::decode::encode_png;
use crate::assets::store::MaterialId;
use crate::foundation::core::Canvas;
use crate::render::raster::Raster;
use crate::sequence::model::Sequence;
use crate::template::codec::export_template;
use crate::tiles::grid::TilePosition;

/// 2x2 sheet of 4x4 tiles, each tile a different solid colour.
fn sheet() -> Vec<u8> {
    let colors = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [9, 9, 9, 255]];
    let mut data = vec![0u8; 8 * 8 * 4];
    for y in 0..8usize {
        for x in 0..8usize {
            let c = colors[(y / 4) * 2 + x / 4];
            data[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4].copy_from_slice(&c);
        }
    }
    encode_png(&Raster::new(8, 8, data).unwrap()).unwrap()
}

fn three_slot_template() -> Template {
    let ids: Vec<_> = (0..3).map(MaterialId::from_u64).collect();
    export_template(&Sequence::from_pattern(&ids, 100).unwrap())
}

fn job() -> BatchJob {
    BatchJob {
        template: three_slot_template(),
        grid: GridSpec::ByCount { cols: 2, rows: 2 },
        selection: TileSelection::All,
        settings: GifSettings::default().with_output_size(4, 4),
    }
}

#[test]
fn failing_source_does_not_abort_batch() {
    let sources = vec![
        BatchSource {
            name: "walk".to_string(),
            bytes: sheet(),
        },
        BatchSource {
            name: "broken".to_string(),
            bytes: b"not an image".to_vec(),
        },
        BatchSource {
            name: "walk".to_string(),
            bytes: sheet(),
        },
    ];
    let report = process_batch(&job(), &sources, None).unwrap();
    assert_eq!(report.items.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.items[1].result,
        Err(GifloomError::Decode(_))
    ));
    let names: Vec<_> = report.items.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["walk.gif", "broken.gif", "walk_1.gif"]);

    let gif = report.items[0].result.as_ref().unwrap();
    assert_eq!(gif.stats.frames, 3);
    assert!(gif.bytes.starts_with(b"GIF89a"));
}

#[test]
fn too_few_selected_tiles_fails_that_source() {
    let mut job = job();
    job.selection = TileSelection::positions([TilePosition::new(0, 0), TilePosition::new(1, 1)]);
    let out = process_source(&job, "s", &sheet(), None);
    assert!(matches!(
        out,
        Err(GifloomError::InsufficientMaterials {
            required: 3,
            available: 2
        })
    ));
}

#[test]
fn invalid_job_fails_up_front() {
    let mut job = job();
    job.grid = GridSpec::ByCount { cols: 0, rows: 1 };
    assert!(process_batch(&job, &[], None).is_err());
}

#[test]
fn cancellation_stops_batch() {
    let token = CancelToken::new();
    token.cancel();
    let sources = vec![BatchSource {
        name: "a".to_string(),
        bytes: sheet(),
    }];
    assert!(matches!(
        process_batch(&job(), &sources, Some(&token)),
        Err(GifloomError::Cancelled)
    ));
}

#[test]
fn grid_precheck_counts_selected_tiles() {
    let t = three_slot_template();
    let grid = GridSpec::ByTileSize {
        tile_width: 16,
        tile_height: 16,
    };
    assert_eq!(
        validate_template_for_grid(&t, grid, &TileSelection::All, 64, 32).unwrap(),
        8
    );
    let sel = TileSelection::positions([TilePosition::new(0, 0), TilePosition::new(9, 9)]);
    assert!(matches!(
        validate_template_for_grid(&t, grid, &sel, 64, 32),
        Err(GifloomError::InsufficientMaterials {
            required: 3,
            available: 1
        })
    ));
    assert!(matches!(
        validate_template_for_grid(&t, grid, &TileSelection::All, 8, 8),
        Err(GifloomError::InsufficientMaterials { available: 0, .. })
    ));
}

#[test]
fn template_settings_override_job_settings() {
    let mut job = job();
    job.template.settings = Some(crate::template::codec::TemplateSettings {
        output_size: Canvas {
            width: 2,
            height: 2,
        },
        canvas_size: None,
        loop_count: 5,
        transparent_background: false,
        palette_size: crate::encode::settings::PaletteSize::C16,
    });
    let s = job.effective_settings();
    assert_eq!(s.output_size, Canvas { width: 2, height: 2 });
    assert_eq!(s.loop_count, 5);
}

#[test]
fn encoded_gif_saves_whole_file_or_nothing() {
    let sources = vec![BatchSource {
        name: "walk".to_string(),
        bytes: sheet(),
    }];
    let report = process_batch(&job(), &sources, None).unwrap();
    let gif = report.items[0].result.as_ref().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&report.items[0].file_name);
    gif.save(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), gif.bytes);

    let missing = dir.path().join("no_such_dir").join("walk.gif");
    assert!(gif.save(&missing).is_err());
    assert!(!missing.exists());
}
