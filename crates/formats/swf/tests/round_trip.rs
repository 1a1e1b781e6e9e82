use swf::actions::{Action, PushValue};
use swf::bits::BitReader;
use swf::context::Context;
use swf::filters::Filter;
use swf::movie::Movie;
use swf::registry::TagRegistry;
use swf::shape::{Line, Shape, ShapeRecord, StyleChange};
use swf::styles::FillStyle;
use swf::tag::{TAG_SET_BACKGROUND_COLOR, Tag};
use swf::tags::control::{FrameLabel, RemoveObject2, SetBackgroundColor};
use swf::tags::define_shape::{DefineShape, DefineShapeKind};
use swf::tags::do_action::DoAction;
use swf::tags::movie_header::MovieHeader;
use swf::tags::opaque::OpaqueTag;
use swf::tags::place::{PlaceObject2, PlaceObject3};
use swf::types::{CharacterId, Color, ColorTransform, Matrix, Rect};

fn empty_header() -> MovieHeader {
    MovieHeader {
        frame_size: Rect::default(),
        frame_rate: 0,
        frame_count: 0,
    }
}

fn minimal_place3() -> PlaceObject3 {
    PlaceObject3 {
        depth: 1,
        is_move: false,
        has_image: false,
        class_name: None,
        character: None,
        matrix: None,
        color_transform: None,
        ratio: None,
        name: None,
        clip_depth: None,
        filters: None,
        blend_mode: None,
        bitmap_cache: None,
        clip_actions: None,
    }
}

#[test]
fn minimal_movie_has_the_pinned_layout() {
    let movie = Movie {
        version: 10,
        compressed: false,
        tags: vec![Tag::Header(empty_header()), Tag::End],
    };
    let bytes = movie.encode().unwrap();
    // FWS, version 10, total 16, a 2-byte zero rect, zero rate and count,
    // and the End tag.
    assert_eq!(
        bytes,
        [
            0x46, 0x57, 0x53, 10, 0x10, 0x00, 0x00, 0x00, // prologue
            0x08, 0x00, // rect: 5-bit width 1, four zero coordinates
            0x00, 0x00, // frame rate
            0x00, 0x00, // frame count
            0x00, 0x00, // End
        ]
    );
    assert_eq!(Movie::decode(&bytes).unwrap(), movie);
}

#[test]
fn declared_length_counts_uncompressed_bytes() {
    let movie = Movie {
        version: 10,
        compressed: false,
        tags: vec![Tag::Header(empty_header()), Tag::End],
    };
    let plain = movie.encode().unwrap();

    let compressed = Movie {
        compressed: true,
        ..movie.clone()
    };
    let bytes = compressed.encode().unwrap();
    assert_eq!(&bytes[..3], b"CWS");
    // Same version and declared length as the plain encoding; only the body
    // storage differs.
    assert_eq!(bytes[3..8], plain[3..8]);
    assert_eq!(Movie::decode(&bytes).unwrap(), compressed);
}

#[test]
fn compressed_movie_with_content_round_trips() {
    let movie = Movie {
        version: 10,
        compressed: true,
        tags: vec![
            Tag::Header(MovieHeader {
                frame_size: Rect {
                    x_min: 0,
                    x_max: 11000,
                    y_min: 0,
                    y_max: 8000,
                },
                frame_rate: 24 << 8,
                frame_count: 1,
            }),
            Tag::SetBackgroundColor(SetBackgroundColor {
                color: Color::rgb(10, 20, 30),
            }),
            Tag::ShowFrame,
            Tag::End,
        ],
    };
    let bytes = movie.encode().unwrap();
    assert_eq!(Movie::decode(&bytes).unwrap(), movie);
}

#[test]
fn rejects_unknown_signature() {
    let bytes = [b'X', b'W', b'S', 10, 16, 0, 0, 0];
    assert!(matches!(
        Movie::decode(&bytes),
        Err(swf::Error::InvalidSignature { found: [b'X', b'W', b'S'] })
    ));
}

#[test]
fn unknown_tag_passes_through_byte_identically() {
    // Hand-assembled file with a tag code this crate does not model.
    #[rustfmt::skip]
    let bytes = [
        0x46, 0x57, 0x53, 6, 0x15, 0x00, 0x00, 0x00, // FWS v6, total 21
        0x08, 0x00, 0x00, 0x00, 0x00, 0x00,          // empty movie header
        0x03, 0x15, 1, 2, 3,                         // code 84, length 3
        0x00, 0x00,                                  // End
    ];
    let movie = Movie::decode(&bytes).unwrap();
    assert_eq!(
        movie.tags[1],
        Tag::Opaque(OpaqueTag {
            code: 84,
            body: vec![1, 2, 3],
        })
    );
    assert_eq!(movie.encode().unwrap(), bytes);
}

#[test]
fn sixty_three_byte_body_forces_the_extended_header() {
    // 62 bytes fits the short form; 63 collides with the escape value and
    // must take the 6-byte header.
    let file_len = |body_len: usize| {
        let movie = Movie {
            version: 10,
            compressed: false,
            tags: vec![
                Tag::Header(empty_header()),
                Tag::Opaque(OpaqueTag {
                    code: 77,
                    body: vec![0xAA; body_len],
                }),
                Tag::End,
            ],
        };
        let bytes = movie.encode().unwrap();
        assert_eq!(Movie::decode(&bytes).unwrap(), movie);
        bytes.len()
    };
    assert_eq!(file_len(62), 8 + 6 + 2 + 62 + 2);
    assert_eq!(file_len(63), 8 + 6 + 6 + 63 + 2);
    assert_eq!(file_len(1023), 8 + 6 + 6 + 1023 + 2);
}

#[test]
fn missing_end_tag_is_appended_on_encode() {
    let movie = Movie {
        version: 10,
        compressed: false,
        tags: vec![Tag::Header(empty_header()), Tag::ShowFrame],
    };
    let bytes = movie.encode().unwrap();
    let decoded = Movie::decode(&bytes).unwrap();
    assert_eq!(decoded.tags.last(), Some(&Tag::End));
    assert_eq!(decoded.tags.len(), 3);
}

#[test]
fn movie_without_header_first_is_rejected() {
    let movie = Movie {
        version: 10,
        compressed: false,
        tags: vec![Tag::ShowFrame, Tag::End],
    };
    assert!(movie.encode().is_err());
}

#[test]
fn every_modeled_tag_survives_a_round_trip() {
    let outline = Shape {
        records: vec![
            ShapeRecord::StyleChange(StyleChange {
                move_to: Some((100, 100)),
                fill0: Some(1),
                ..Default::default()
            }),
            ShapeRecord::Line(Line { dx: 800, dy: 0 }),
            ShapeRecord::Line(Line { dx: -400, dy: 600 }),
            ShapeRecord::Line(Line { dx: -400, dy: -600 }),
        ],
    };
    let movie = Movie {
        version: 10,
        compressed: false,
        tags: vec![
            Tag::Header(MovieHeader {
                frame_size: Rect {
                    x_min: 0,
                    x_max: 11000,
                    y_min: 0,
                    y_max: 8000,
                },
                frame_rate: (12 << 8) | 128,
                frame_count: 2,
            }),
            Tag::SetBackgroundColor(SetBackgroundColor {
                color: Color::rgb(0xEE, 0xEE, 0xFF),
            }),
            Tag::DefineShape(DefineShape {
                kind: DefineShapeKind::Shape3,
                id: CharacterId::new(1).unwrap(),
                bounds: Rect {
                    x_min: 100,
                    x_max: 900,
                    y_min: 100,
                    y_max: 700,
                },
                fills: vec![FillStyle::Solid(Color::rgba(0, 160, 0, 190))],
                lines: vec![],
                shape: outline,
            }),
            Tag::FrameLabel(FrameLabel {
                name: "loop".into(),
                anchor: true,
            }),
            Tag::PlaceObject2(PlaceObject2 {
                depth: 1,
                is_move: false,
                character: Some(CharacterId::new(1).unwrap()),
                matrix: Some(Matrix {
                    scale: Some((0x1_0000, 0x1_0000)),
                    rotate: None,
                    translate: (2000, 1500),
                }),
                color_transform: Some(ColorTransform {
                    mult: Some((256, 256, 256, 128)),
                    add: None,
                }),
                ratio: None,
                name: Some("tri".into()),
                clip_depth: None,
                clip_actions: None,
            }),
            Tag::PlaceObject3(PlaceObject3 {
                depth: 2,
                character: Some(CharacterId::new(1).unwrap()),
                class_name: Some("shapes.Triangle".into()),
                filters: Some(vec![Filter::Blur {
                    blur_x: 2 << 16,
                    blur_y: 2 << 16,
                    passes: 1 << 3,
                }]),
                blend_mode: Some(2),
                ..minimal_place3()
            }),
            Tag::DoAction(DoAction {
                actions: vec![
                    Action::Push(vec![PushValue::Str("go".into()), PushValue::Int(1)]),
                    Action::Stop,
                ],
            }),
            Tag::ShowFrame,
            Tag::RemoveObject2(RemoveObject2 { depth: 2 }),
            Tag::ShowFrame,
            Tag::End,
        ],
    };
    let bytes = movie.encode().unwrap();
    assert_eq!(Movie::decode(&bytes).unwrap(), movie);
}

#[test]
fn a_substituted_strategy_takes_over_its_code() {
    fn decode_raw(
        code: u16,
        length: u32,
        r: &mut BitReader<'_>,
        _ctx: &mut Context<'_>,
    ) -> swf::Result<Tag> {
        Ok(Tag::Opaque(OpaqueTag {
            code,
            body: r.read_bytes(length as usize)?.to_vec(),
        }))
    }

    let movie = Movie {
        version: 10,
        compressed: false,
        tags: vec![
            Tag::Header(empty_header()),
            Tag::SetBackgroundColor(SetBackgroundColor {
                color: Color::rgb(1, 2, 3),
            }),
            Tag::End,
        ],
    };
    let bytes = movie.encode().unwrap();

    let mut registry = TagRegistry::default();
    registry.set_movie_decoder(TAG_SET_BACKGROUND_COLOR, decode_raw);
    let decoded = Movie::decode_with(&bytes, &registry).unwrap();
    assert_eq!(
        decoded.tags[1],
        Tag::Opaque(OpaqueTag {
            code: TAG_SET_BACKGROUND_COLOR,
            body: vec![1, 2, 3],
        })
    );
    // The raw rendition re-encodes to the same file.
    assert_eq!(decoded.encode().unwrap(), bytes);
}

// ── Committed fixtures ───────────────────────────────────────────────────────
//
// Regenerate with `cargo run -p swf --bin gen_fixtures`.

fn load_fixture(name: &str) -> Option<Vec<u8>> {
    std::fs::read(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .ok()
}

#[test]
fn fixtures_round_trip_byte_identically() {
    for name in [
        "minimal.swf",
        "red_square.swf",
        "scripted.swf",
    ] {
        let Some(data) = load_fixture(name) else {
            eprintln!("skipping: {name} not generated");
            continue;
        };
        let movie = Movie::decode(&data).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(movie.encode().unwrap(), data, "{name}");
    }
}

#[test]
fn compressed_fixture_matches_its_plain_twin() {
    let (Some(plain), Some(compressed)) = (
        load_fixture("red_square.swf"),
        load_fixture("red_square_compressed.swf"),
    ) else {
        eprintln!("skipping: fixtures not generated");
        return;
    };
    let a = Movie::decode(&plain).unwrap();
    let b = Movie::decode(&compressed).unwrap();
    assert!(!a.compressed);
    assert!(b.compressed);
    assert_eq!(a.tags, b.tags);
}
