//! Fixture generator for swf integration tests.
//!
//! Generates small synthetic `.swf` files into `tests/fixtures/`. These are
//! committed to the repo and serve as:
//!
//!   1. **Regression tests** for the codec (`tests/round_trip.rs`), pinning
//!      the on-disk layout independently of the encoder of the day.
//!   2. **Reference inputs** for eyeballing against third-party tools
//!      (swfdump, JPEXS) when a layout question comes up.
//!
//! # Usage
//!
//! ```
//! cargo run -p swf --bin gen_fixtures
//! ```

use swf::actions::Action;
use swf::movie::Movie;
use swf::shape::{Line, Shape, ShapeRecord, StyleChange};
use swf::styles::FillStyle;
use swf::tag::Tag;
use swf::tags::control::{FrameLabel, SetBackgroundColor};
use swf::tags::define_shape::{DefineShape, DefineShapeKind};
use swf::tags::do_action::DoAction;
use swf::tags::movie_header::MovieHeader;
use swf::tags::opaque::OpaqueTag;
use swf::tags::place::PlaceObject2;
use swf::types::{CharacterId, Color, Matrix, Rect};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn main() -> std::io::Result<()> {
    std::fs::create_dir_all(FIXTURES_DIR)?;

    write("minimal.swf", build_minimal())?;
    write("red_square.swf", build_red_square(false))?;
    write("red_square_compressed.swf", build_red_square(true))?;
    write("scripted.swf", build_scripted())?;

    Ok(())
}

fn write(name: &str, movie: Movie) -> std::io::Result<()> {
    let data = movie.encode().expect("fixture must encode");
    let path = format!("{FIXTURES_DIR}/{name}");
    std::fs::write(&path, &data)?;
    println!("wrote {name} ({} bytes)", data.len());
    Ok(())
}

fn stage(width_px: i32, height_px: i32) -> MovieHeader {
    MovieHeader {
        frame_size: Rect {
            x_min: 0,
            x_max: width_px * 20,
            y_min: 0,
            y_max: height_px * 20,
        },
        frame_rate: 12 << 8,
        frame_count: 1,
    }
}

/// Smallest well-formed movie: header and End.
fn build_minimal() -> Movie {
    Movie {
        version: 10,
        compressed: false,
        tags: vec![
            Tag::Header(MovieHeader {
                frame_size: Rect::default(),
                frame_rate: 0,
                frame_count: 0,
            }),
            Tag::End,
        ],
    }
}

/// One red square defined, placed, and shown for a single frame.
fn build_red_square(compressed: bool) -> Movie {
    let square = Shape {
        records: vec![
            ShapeRecord::StyleChange(StyleChange {
                move_to: Some((0, 0)),
                fill0: Some(1),
                ..Default::default()
            }),
            ShapeRecord::Line(Line { dx: 2000, dy: 0 }),
            ShapeRecord::Line(Line { dx: 0, dy: 2000 }),
            ShapeRecord::Line(Line { dx: -2000, dy: 0 }),
            ShapeRecord::Line(Line { dx: 0, dy: -2000 }),
        ],
    };
    Movie {
        version: 10,
        compressed,
        tags: vec![
            Tag::Header(stage(550, 400)),
            Tag::SetBackgroundColor(SetBackgroundColor {
                color: Color::rgb(255, 255, 255),
            }),
            Tag::DefineShape(DefineShape {
                kind: DefineShapeKind::Shape,
                id: CharacterId::new(1).unwrap(),
                bounds: Rect {
                    x_min: 0,
                    x_max: 2000,
                    y_min: 0,
                    y_max: 2000,
                },
                fills: vec![FillStyle::Solid(Color::rgb(255, 0, 0))],
                lines: vec![],
                shape: square,
            }),
            Tag::PlaceObject2(PlaceObject2 {
                depth: 1,
                is_move: false,
                character: Some(CharacterId::new(1).unwrap()),
                matrix: Some(Matrix {
                    scale: None,
                    rotate: None,
                    translate: (4500, 3000),
                }),
                color_transform: None,
                ratio: None,
                name: None,
                clip_depth: None,
                clip_actions: None,
            }),
            Tag::ShowFrame,
            Tag::End,
        ],
    }
}

/// A labeled frame that stops the playhead, plus one tag this crate does not
/// model (DefineSceneAndFrameLabelData) carried opaquely.
fn build_scripted() -> Movie {
    Movie {
        version: 10,
        compressed: false,
        tags: vec![
            Tag::Header(stage(550, 400)),
            Tag::Opaque(OpaqueTag {
                code: 86,
                body: vec![1, 0, 0, b'a', 0, 1, 0],
            }),
            Tag::FrameLabel(FrameLabel {
                name: "start".into(),
                anchor: false,
            }),
            Tag::DoAction(DoAction {
                actions: vec![Action::Stop],
            }),
            Tag::ShowFrame,
            Tag::End,
        ],
    }
}
