use super::*;
use crate::assets::store::{MaterialId, MaterialOrigin};

fn canvas() -> Canvas {
    Canvas::new(3, 2).unwrap()
}

fn store_with(colors: &[[u8; 4]]) -> (MaterialStore, Vec<MaterialId>) {
    let mut store = MaterialStore::new();
    let ids = colors
        .iter()
        .map(|c| {
            store.add(
                Raster::filled(canvas(), *c),
                MaterialOrigin::File {
                    name: "c".to_string(),
                },
            )
        })
        .collect();
    (store, ids)
}

#[test]
fn parallel_output_matches_sequential_order() {
    let colors: Vec<[u8; 4]> = (0..10u8).map(|i| [i * 20, 0, 0, 255]).collect();
    let (store, ids) = store_with(&colors);
    let seq = Sequence::from_pattern(&ids, 30).unwrap();
    let opts = ComposeOpts::default();

    let serial = RenderThreading {
        parallel: false,
        ..RenderThreading::default()
    };
    let parallel = RenderThreading {
        chunk_size: 3,
        threads: Some(2),
        ..RenderThreading::default()
    };
    let (a, _) = render_sequence(&seq, &store, canvas(), &opts, &serial, None).unwrap();
    let (b, _) = render_sequence(&seq, &store, canvas(), &opts, &parallel, None).unwrap();
    assert_eq!(a, b);
    for (i, f) in b.iter().enumerate() {
        assert_eq!(f.raster.pixel(0, 0), Some(colors[i]));
        assert_eq!(f.duration_ms, 30);
    }
}

#[test]
fn repeated_frames_are_rendered_once() {
    let (store, ids) = store_with(&[[1, 2, 3, 255], [4, 5, 6, 255]]);
    let mut seq = Sequence::from_pattern(&ids, 100).unwrap();
    seq.repeat(&[0, 1], 3).unwrap();

    let (frames, stats) = render_sequence(
        &seq,
        &store,
        canvas(),
        &ComposeOpts::default(),
        &RenderThreading::default(),
        None,
    )
    .unwrap();
    assert_eq!(frames.len(), 6);
    assert_eq!(stats.frames_total, 6);
    assert_eq!(stats.frames_rendered, 2);
    assert_eq!(stats.frames_elided, 4);
    assert_eq!(frames[4].raster, frames[0].raster);
}

#[test]
fn removed_material_is_substituted_not_fatal() {
    let (mut store, ids) = store_with(&[[9, 9, 9, 255], [7, 7, 7, 255]]);
    store.remove(ids[1]).unwrap();
    let seq = Sequence::from_pattern(&ids, 100).unwrap();

    let (frames, stats) = render_sequence(
        &seq,
        &store,
        canvas(),
        &ComposeOpts::default(),
        &RenderThreading::default(),
        None,
    )
    .unwrap();
    assert!(!frames[0].substituted);
    assert!(frames[1].substituted);
    assert_eq!(stats.frames_substituted, 1);
    assert_eq!(frames[1].raster, Raster::transparent(canvas()));
}

#[test]
fn cancelled_token_stops_render() {
    let (store, ids) = store_with(&[[1, 1, 1, 255]]);
    let seq = Sequence::from_pattern(&ids, 100).unwrap();
    let token = CancelToken::new();
    token.cancel();
    let err = render_sequence(
        &seq,
        &store,
        canvas(),
        &ComposeOpts::default(),
        &RenderThreading::default(),
        Some(&token),
    )
    .unwrap_err();
    assert!(matches!(err, GifloomError::Cancelled));
}

#[test]
fn preview_checks_index_and_tolerates_removal() {
    let (mut store, ids) = store_with(&[[5, 6, 7, 255]]);
    let seq = Sequence::from_pattern(&ids, 100).unwrap();
    let opts = ComposeOpts::default();
    assert!(matches!(
        render_preview(&seq, &store, 1, canvas(), &opts),
        Err(GifloomError::IndexOutOfRange { index: 1, len: 1 })
    ));
    store.remove(ids[0]).unwrap();
    let raster = render_preview(&seq, &store, 0, canvas(), &opts).unwrap();
    assert_eq!(raster, Raster::transparent(canvas()));
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
}
