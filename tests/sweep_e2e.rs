//! End-to-end sweep runs against real model files and photo fixtures.
//!
//! These require the ONNX models under `models/` and the photos under
//! `tests/fixtures/`, so they are ignored by default:
//!
//!     cargo test -- --ignored

use facesweep::{
    compare::FaceComparator, config::Config, report, sweep, FlagSet, RowOutcome,
};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures")).join(name)
}

fn comparator() -> FaceComparator {
    FaceComparator::new(&Config::default()).expect("models under models/ are required")
}

#[test]
#[ignore]
fn self_comparison_scores_near_one_hundred() {
    let mut comparator = comparator();
    let photo = fixture("person_a_1.jpg");

    for flags in FlagSet::combinations() {
        let outcome = comparator
            .compare(&photo, &photo, &flags)
            .expect("comparison should not fault");
        match outcome {
            facesweep::Comparison::Similarity(score) => {
                assert!(
                    score > 99.0,
                    "self-comparison under {:?} scored {}",
                    flags,
                    score
                );
            }
            other => panic!("self-comparison under {:?} produced {:?}", flags, other),
        }
    }
}

#[test]
#[ignore]
fn same_person_scores_above_ninety_without_preprocessing() {
    let mut comparator = comparator();
    let rows = sweep::run_sweep(
        &mut comparator,
        &fixture("person_a_1.jpg"),
        &fixture("person_a_2.jpg"),
    );

    assert_eq!(rows.len(), 8);
    println!("{}", report::render_table(&rows));

    let plain = rows
        .iter()
        .find(|row| !row.flags.grayscale && !row.flags.bilateral && !row.flags.landmarks)
        .unwrap();
    let score = plain.outcome.score().expect("plain configuration scored");
    assert!(score > 90.0, "plain configuration scored {}", score);

    for row in &rows {
        if let Some(score) = row.outcome.score() {
            assert!((0.0..=100.0).contains(&score));
        }
    }
}

#[test]
#[ignore]
fn blank_images_yield_eight_absent_rows() {
    let blank_path = std::env::temp_dir().join("facesweep_blank.png");
    image::RgbImage::from_pixel(256, 256, image::Rgb([255, 255, 255]))
        .save(&blank_path)
        .unwrap();

    let mut comparator = comparator();
    let rows = sweep::run_sweep(&mut comparator, &blank_path, &blank_path);

    assert_eq!(rows.len(), 8);
    for row in &rows {
        assert_eq!(row.outcome, RowOutcome::FacesNotDetected, "{:?}", row.flags);
    }
}
