use super::*;
use crate::assets::store::MaterialOrigin;
use crate::foundation::core::Canvas;
use crate::render::raster::Raster;

fn id(n: u64) -> MaterialId {
    MaterialId::from_u64(n)
}

#[test]
fn zero_duration_is_rejected_everywhere() {
    assert!(Frame::simple(id(1), 0).is_err());
    assert!(Sequence::from_pattern(&[id(1)], 0).is_err());
    assert!(Sequence::from_timed([(id(1), 100), (id(2), 0)]).is_err());

    let mut f = Frame::simple(id(1), 50).unwrap();
    assert!(f.set_duration_ms(0).is_err());
    assert_eq!(f.duration_ms(), 50);
}

#[test]
fn layer_validation_rejects_bad_numbers() {
    assert!(Layer::new(id(1)).validate().is_ok());
    assert!(Layer::new(id(1)).with_scale(0.0, 1.0).validate().is_err());
    assert!(Layer::new(id(1)).with_scale(1.0, f32::NAN).validate().is_err());
    assert!(Layer::new(id(1)).with_opacity(1.5).validate().is_err());
    assert!(
        Layer::new(id(1))
            .with_crop(PixelRect::new(0, 0, 0, 4))
            .validate()
            .is_err()
    );
    assert!(Frame::layered(vec![Layer::new(id(1)).with_opacity(-0.1)], 100).is_err());
}

#[test]
fn layer_edit_promotes_simple_frame() {
    let mut f = Frame::simple(id(1), 100).unwrap();
    assert_eq!(f.layer_count(), 1);
    f.push_layer(Layer::new(id(2)).with_offset(3, 4)).unwrap();
    match &f.content {
        FrameContent::Layered { layers } => {
            assert_eq!(layers.len(), 2);
            assert_eq!(layers[0], Layer::fitted(id(1)));
            assert!(!layers[1].fit_canvas);
            assert_eq!((layers[1].offset_x, layers[1].offset_y), (3, 4));
        }
        other => panic!("expected layered frame, got {other:?}"),
    }
}

#[test]
fn layer_reorder_and_remove() {
    let mut f = Frame::layered(
        vec![Layer::new(id(1)), Layer::new(id(2)), Layer::new(id(3))],
        80,
    )
    .unwrap();
    f.move_layer(0, 2).unwrap();
    assert_eq!(f.material_ids(), vec![id(2), id(3), id(1)]);

    let removed = f.remove_layer(1).unwrap();
    assert_eq!(removed.material_id, id(3));
    assert_eq!(f.material_ids(), vec![id(2), id(1)]);

    f.insert_layer(0, Layer::new(id(9))).unwrap();
    assert_eq!(f.material_ids(), vec![id(9), id(2), id(1)]);

    assert!(matches!(
        f.move_layer(0, 3),
        Err(GifloomError::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert!(f.insert_layer(5, Layer::new(id(4))).is_err());
    assert_eq!(f.layer_count(), 3);
}

#[test]
fn pattern_builds_simple_frames_in_order() {
    let seq = Sequence::from_pattern(&[id(3), id(1), id(3)], 40).unwrap();
    assert_eq!(seq.len(), 3);
    assert_eq!(seq.total_duration_ms(), 120);
    let ids: Vec<_> = seq.frames().iter().flat_map(|f| f.material_ids()).collect();
    assert_eq!(ids, vec![id(3), id(1), id(3)]);
    assert!(seq.get(3).is_err());
}

#[test]
fn dangling_references_report_frame_and_layer() {
    let mut store = MaterialStore::new();
    let px = Raster::transparent(Canvas::new(1, 1).unwrap());
    let kept = store.add(px.clone(), MaterialOrigin::File { name: "a".into() });
    let gone = store.add(px, MaterialOrigin::File { name: "b".into() });

    let seq = Sequence::from_frames(vec![
        Frame::simple(gone, 100).unwrap(),
        Frame::layered(vec![Layer::new(kept), Layer::new(gone)], 100).unwrap(),
        Frame::simple(kept, 100).unwrap(),
    ]);
    assert!(seq.dangling_references(&store).is_empty());

    store.remove(gone).unwrap();
    let refs = seq.dangling_references(&store);
    assert_eq!(
        refs,
        vec![
            DanglingRef {
                frame_index: 0,
                layer_index: None,
                material_id: gone,
            },
            DanglingRef {
                frame_index: 1,
                layer_index: Some(1),
                material_id: gone,
            },
        ]
    );
}

#[test]
fn replace_material_rewrites_all_references() {
    let mut seq = Sequence::from_frames(vec![
        Frame::simple(id(1), 100).unwrap(),
        Frame::layered(vec![Layer::new(id(1)), Layer::new(id(2))], 100).unwrap(),
    ]);
    assert_eq!(seq.replace_material(id(1), id(7)), 2);
    let ids: Vec<_> = seq.frames().iter().flat_map(|f| f.material_ids()).collect();
    assert_eq!(ids, vec![id(7), id(7), id(2)]);
}
