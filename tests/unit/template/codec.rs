use super::*;

fn id(n: u64) -> MaterialId {
    MaterialId::from_u64(n)
}

fn sample() -> Sequence {
    Sequence::from_frames(vec![
        Frame::simple(id(10), 80).unwrap(),
        Frame::layered(
            vec![
                Layer::new(id(11)).with_offset(-2, 5).with_opacity(0.5),
                Layer::new(id(10))
                    .with_crop(PixelRect::new(1, 1, 4, 4))
                    .with_scale(2.0, 0.5)
                    .hidden(),
            ],
            120,
        )
        .unwrap(),
        Frame::simple(id(12), 40).unwrap(),
    ])
}

#[test]
fn slots_follow_first_use() {
    let t = export_template(&sample());
    assert_eq!(t.slot_count, 3);
    assert_eq!(t.frames[0].content, TemplateContent::Simple { slot: 0 });
    match &t.frames[1].content {
        TemplateContent::Layered { layers } => {
            assert_eq!(layers[0].slot, 1);
            assert_eq!(layers[1].slot, 0);
        }
        other => panic!("expected layered, got {other:?}"),
    }
    assert_eq!(t.frames[2].content, TemplateContent::Simple { slot: 2 });
}

#[test]
fn first_n_round_trip_reproduces_sequence() {
    let seq = sample();
    let t = export_template(&seq);
    let back = import_template(&t, &BindMode::FirstN, &[id(10), id(11), id(12), id(99)]).unwrap();
    assert_eq!(back, seq);
}

#[test]
fn round_trip_through_json_text() {
    let seq = sample();
    let t = export_template(&seq).with_settings(TemplateSettings {
        output_size: Canvas {
            width: 64,
            height: 48,
        },
        canvas_size: None,
        loop_count: 2,
        transparent_background: true,
        palette_size: PaletteSize::C64,
    });
    let text = t.to_json_string().unwrap();
    let parsed = Template::from_json_str(&text).unwrap();
    assert_eq!(parsed, t);
    let back = import_template(&parsed, &BindMode::FirstN, &[id(10), id(11), id(12)]).unwrap();
    assert_eq!(back, seq);
}

#[test]
fn too_few_materials_is_insufficient() {
    let t = export_template(&sample());
    let err = import_template(&t, &BindMode::FirstN, &[id(1), id(2)]).unwrap_err();
    assert!(matches!(
        err,
        GifloomError::InsufficientMaterials {
            required: 3,
            available: 2
        }
    ));
}

#[test]
fn selected_binding_uses_given_order() {
    let t = export_template(&sample());
    let available = [id(1), id(2), id(3), id(4)];
    let seq =
        import_template(&t, &BindMode::Selected(vec![id(4), id(2), id(1)]), &available).unwrap();
    let ids: Vec<_> = seq.frames().iter().flat_map(|f| f.material_ids()).collect();
    assert_eq!(ids, vec![id(4), id(2), id(4), id(1)]);

    let err = import_template(&t, &BindMode::Selected(vec![id(4), id(7), id(1)]), &available)
        .unwrap_err();
    assert!(err.is_not_found());
    let err = import_template(&t, &BindMode::Selected(vec![id(4)]), &available).unwrap_err();
    assert!(matches!(err, GifloomError::InsufficientMaterials { .. }));
}

#[test]
fn parse_rejects_bad_version_and_slots() {
    let mut t = export_template(&sample());
    t.version = "9".to_string();
    let text = serde_json::to_string(&t).unwrap();
    assert!(matches!(
        Template::from_json_str(&text),
        Err(GifloomError::Serde(_))
    ));

    let mut t = export_template(&sample());
    t.slot_count = 1;
    assert!(t.validate().is_err());
    assert!(matches!(
        Template::from_json_str("{not json"),
        Err(GifloomError::Serde(_))
    ));
}

#[test]
fn layer_defaults_fill_missing_fields() {
    let text = r#"{
        "version": "1",
        "slot_count": 1,
        "frames": [{"duration_ms": 50, "kind": "layered", "layers": [{"slot": 0}]}]
    }"#;
    let t = Template::from_json_str(text).unwrap();
    let seq = import_template(&t, &BindMode::FirstN, &[id(5)]).unwrap();
    assert_eq!(seq.frames()[0].content, FrameContent::Layered {
        layers: vec![Layer::new(id(5))]
    });
}

#[test]
fn info_summarises_structure() {
    let info = export_template(&sample()).info();
    assert_eq!(info.frame_count, 3);
    assert_eq!(info.slot_count, 3);
    assert_eq!(info.total_layers, 4);
    assert_eq!(info.total_duration_ms, 240);
    assert_eq!(info.settings, None);
}

#[test]
fn settings_overlay_keeps_other_fields() {
    let base = GifSettings {
        diff_threshold: 0.5,
        ..GifSettings::default()
    };
    let ts = TemplateSettings {
        output_size: Canvas {
            width: 10,
            height: 20,
        },
        canvas_size: None,
        loop_count: 1,
        transparent_background: true,
        palette_size: PaletteSize::C16,
    };
    let merged = ts.apply_to(base);
    assert_eq!(merged.output_size, ts.output_size);
    assert_eq!(merged.diff_threshold, 0.5);
    assert_eq!(TemplateSettings::from_gif_settings(&merged), ts);
}

#[test]
fn file_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.json");
    let t = export_template(&sample());
    t.save(&path).unwrap();
    assert_eq!(Template::load(&path).unwrap(), t);
    assert!(Template::load(dir.path().join("missing.json")).is_err());
}

#[test]
fn promoted_base_layer_stays_fitted_through_json() {
    let mut frame = Frame::simple(id(1), 100).unwrap();
    frame.push_layer(Layer::new(id(2)).with_offset(3, 3)).unwrap();
    let seq = Sequence::from_frames(vec![frame]);

    let text = export_template(&seq).to_json_string().unwrap();
    assert_eq!(text.matches("fit_canvas").count(), 1);
    let parsed = Template::from_json_str(&text).unwrap();
    let back = import_template(&parsed, &BindMode::FirstN, &[id(1), id(2)]).unwrap();
    assert_eq!(back, seq);
}
