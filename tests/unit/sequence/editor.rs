use super::*;
use crate::assets::store::MaterialId;
use crate::foundation::error::GifloomError;

/// Sequence of simple frames whose material ids are `0..n`, so ids double as labels.
fn seq(n: u64) -> Sequence {
    let ids: Vec<_> = (0..n).map(MaterialId::from_u64).collect();
    Sequence::from_pattern(&ids, 100).unwrap()
}

fn labels(s: &Sequence) -> Vec<u64> {
    s.frames()
        .iter()
        .map(|f| f.material_ids()[0].as_u64())
        .collect()
}

#[test]
fn selection_is_sorted_and_deduped() {
    let s = seq(5);
    assert_eq!(s.validate_selection(&[3, 1, 3]).unwrap(), vec![1, 3]);
    assert!(matches!(
        s.validate_selection(&[]),
        Err(GifloomError::InvalidInput(_))
    ));
    assert!(matches!(
        s.validate_selection(&[0, 5]),
        Err(GifloomError::IndexOutOfRange { index: 5, len: 5 })
    ));
}

#[test]
fn insert_accepts_end_position() {
    let mut s = seq(2);
    s.insert(2, Frame::simple(MaterialId::from_u64(9), 10).unwrap())
        .unwrap();
    s.insert(0, Frame::simple(MaterialId::from_u64(8), 10).unwrap())
        .unwrap();
    assert_eq!(labels(&s), vec![8, 0, 1, 9]);
    assert!(
        s.insert(5, Frame::simple(MaterialId::from_u64(7), 10).unwrap())
            .is_err()
    );
}

#[test]
fn remove_returns_frames_in_order() {
    let mut s = seq(5);
    let removed = s.remove(&[4, 1]).unwrap();
    let removed: Vec<_> = removed.iter().map(|f| f.material_ids()[0].as_u64()).collect();
    assert_eq!(removed, vec![1, 4]);
    assert_eq!(labels(&s), vec![0, 2, 3]);
}

#[test]
fn failed_edit_leaves_sequence_untouched() {
    let mut s = seq(4);
    let before = s.clone();
    assert!(s.remove(&[1, 9]).is_err());
    assert!(s.move_frames(&[0, 7], 1).is_err());
    assert!(s.move_frames(&[0], 5).is_err());
    assert!(s.set_duration(&[0, 4], 50).is_err());
    assert!(s.set_duration(&[0], 0).is_err());
    assert!(s.repeat(&[0], 0).is_err());
    assert!(s.reverse(&[]).is_err());
    assert_eq!(s, before);
}

#[test]
fn move_block_forward_and_backward() {
    let mut s = seq(5);
    s.move_frames(&[0, 1], 4).unwrap();
    assert_eq!(labels(&s), vec![2, 3, 0, 1, 4]);

    let mut s = seq(5);
    s.move_frames(&[3, 4], 0).unwrap();
    assert_eq!(labels(&s), vec![3, 4, 0, 1, 2]);

    let mut s = seq(5);
    s.move_frames(&[1, 3], 5).unwrap();
    assert_eq!(labels(&s), vec![0, 2, 4, 1, 3]);
}

#[test]
fn move_onto_selected_position_is_stable() {
    let mut s = seq(4);
    s.move_frames(&[1, 2], 2).unwrap();
    assert_eq!(labels(&s), vec![0, 1, 2, 3]);
}

#[test]
fn duplicate_inserts_after_last_selected() {
    let mut s = seq(4);
    let range = s.duplicate(&[0, 2]).unwrap();
    assert_eq!(range, 3..5);
    assert_eq!(labels(&s), vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn set_duration_touches_only_selection() {
    let mut s = seq(3);
    s.set_duration(&[1], 250).unwrap();
    let d: Vec<_> = s.frames().iter().map(|f| f.duration_ms()).collect();
    assert_eq!(d, vec![100, 250, 100]);
    s.set_all_durations(40).unwrap();
    assert_eq!(s.total_duration_ms(), 120);
}

#[test]
fn repeat_pair_three_times() {
    let mut s = seq(2);
    s.repeat(&[0, 1], 3).unwrap();
    assert_eq!(labels(&s), vec![0, 1, 0, 1, 0, 1]);
}

#[test]
fn repeat_keeps_trailing_frames_after_block() {
    let mut s = seq(3);
    s.repeat(&[0], 2).unwrap();
    assert_eq!(labels(&s), vec![0, 0, 1, 2]);

    let mut s = seq(3);
    s.repeat(&[1], 1).unwrap();
    assert_eq!(labels(&s), vec![0, 1, 2]);
}

#[test]
fn repeat_rejects_counts_that_would_overflow_the_timeline() {
    let mut s = seq(3);
    let before = s.clone();
    for count in [usize::MAX, MAX_FRAMES] {
        assert!(matches!(
            s.repeat(&[0, 1], count),
            Err(GifloomError::InvalidInput(_))
        ));
    }
    assert_eq!(s, before);

    s.repeat(&[2], MAX_FRAMES - 3 + 1).unwrap();
    assert_eq!(s.len(), MAX_FRAMES);
}

#[test]
fn reverse_contiguous_range() {
    let mut s = seq(4);
    s.reverse(&[1, 2, 3]).unwrap();
    assert_eq!(labels(&s), vec![0, 3, 2, 1]);
}

#[test]
fn reverse_sparse_selection_mirrors_bounding_range() {
    let mut s = seq(5);
    s.reverse(&[1, 3]).unwrap();
    assert_eq!(labels(&s), vec![0, 3, 2, 1, 4]);
}
