use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    let c = Canvas::new(4, 3).unwrap();
    assert_eq!(c.pixel_count(), 12);
    assert_eq!(c.rgba_len(), 48);
}

#[test]
fn clip_keeps_inner_rect() {
    let r = PixelRect::new(1, 1, 2, 2);
    assert_eq!(r.clip_to(8, 8), Some(r));
}

#[test]
fn clip_trims_overhang() {
    let r = PixelRect::new(6, 5, 10, 10);
    assert_eq!(r.clip_to(8, 8), Some(PixelRect::new(6, 5, 2, 3)));
}

#[test]
fn clip_outside_is_none() {
    assert_eq!(PixelRect::new(8, 0, 1, 1).clip_to(8, 8), None);
    assert_eq!(PixelRect::new(0, 0, 0, 4).clip_to(8, 8), None);
}
