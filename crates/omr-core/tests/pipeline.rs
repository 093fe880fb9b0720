//! End-to-end tests over synthetic answer sheets.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use omr_core::stages::{Binarizer, RegionLocator};
use omr_core::{
    grade, AnswerKey, DetectionMode, DiagnosticKind, EngineConfig, ErrorKind, KeyQuestion,
    OmrEngine, OmrError, ProcessingOptions, QualityVerdict, Region, SheetReader,
};
use omr_test_support::{
    FailingDebugStorage, MockDebugStorage, SyntheticBinaryBuilder, SyntheticSheetBuilder,
};

const LABELS: [&str; 4] = ["A", "B", "C", "D"];

fn engine() -> OmrEngine {
    OmrEngine::new(EngineConfig::default()).expect("default config is valid")
}

fn options(questions: u32) -> ProcessingOptions {
    ProcessingOptions::builder()
        .question_count(questions)
        .choice_labels(LABELS)
        .build()
        .unwrap()
}

fn debug_options(questions: u32) -> ProcessingOptions {
    ProcessingOptions::builder()
        .question_count(questions)
        .choice_labels(LABELS)
        .debug(true)
        .build()
        .unwrap()
}

fn marked_sheet() -> SyntheticSheetBuilder {
    SyntheticSheetBuilder::new(5, &LABELS)
        .mark(1, "A")
        .mark(2, "C")
        .mark(4, "D")
}

#[test]
fn test_one_record_per_question_in_order() {
    let result = engine()
        .process(&marked_sheet().png_bytes(), &options(5))
        .unwrap();

    let numbers: Vec<_> = result.answers.iter().map(|a| a.question_number).collect();
    assert_eq!(numbers, [1, 2, 3, 4, 5]);
    for answer in &result.answers {
        let labels: Vec<_> = answer.densities.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, LABELS);
    }
}

#[test]
fn test_reads_marked_answers() {
    let result = engine()
        .process(&marked_sheet().png_bytes(), &options(5))
        .unwrap();

    let answers = result.answers_by_question();
    assert_eq!(answers[&1].as_deref(), Some("A"));
    assert_eq!(answers[&2].as_deref(), Some("C"));
    assert_eq!(answers[&3], None);
    assert_eq!(answers[&4].as_deref(), Some("D"));
    assert_eq!(answers[&5], None);

    let first = result.answer(1).unwrap();
    assert_eq!(first.verdict, QualityVerdict::Clear);
    assert!(first.confidence > 0.5);
    assert_eq!(result.answer(3).unwrap().verdict, QualityVerdict::Blank);

    let flags = result.flags();
    assert_eq!(flags.blank, [3, 5]);
    assert!(flags.multiple.is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_double_mark_is_multiple() {
    let sheet = SyntheticSheetBuilder::new(3, &LABELS)
        .mark(1, "A")
        .mark(1, "B")
        .mark(2, "B");

    let result = engine().process(&sheet.png_bytes(), &options(3)).unwrap();

    assert_eq!(result.answers[0].verdict, QualityVerdict::Multiple);
    assert!(result.answers[0].chosen_label.is_some());
    assert_eq!(result.answers[1].verdict, QualityVerdict::Clear);
    assert_eq!(result.answers[1].chosen_label.as_deref(), Some("B"));
    assert_eq!(result.flags().multiple, [1]);
}

#[test]
fn test_manual_region_matches_auto() {
    let sheet = marked_sheet();
    let manual = ProcessingOptions::builder()
        .question_count(5)
        .choice_labels(LABELS)
        .mode(DetectionMode::ManualRegion)
        .region(sheet.grid_region())
        .build()
        .unwrap();

    let engine = engine();
    let auto_result = engine.process(&sheet.png_bytes(), &options(5)).unwrap();
    let manual_result = engine.process(&sheet.png_bytes(), &manual).unwrap();

    assert_eq!(
        auto_result.answers_by_question(),
        manual_result.answers_by_question()
    );
}

#[test]
fn test_auto_locates_grid_bounds() {
    let sheet = marked_sheet();
    let binary = Binarizer::default().binarize_luma(&sheet.build());
    let region = RegionLocator::default().search(&binary).unwrap();
    let expected = sheet.grid_region();

    assert!(region.x().abs_diff(expected.x()) <= 2);
    assert!(region.y().abs_diff(expected.y()) <= 2);
    assert!(region.width().abs_diff(expected.width()) <= 4);
    assert!(region.height().abs_diff(expected.height()) <= 4);
}

#[test]
fn test_jpeg_input_is_read() {
    let result = engine()
        .process(&marked_sheet().jpeg_bytes(), &options(5))
        .unwrap();
    assert_eq!(result.question_count(), 5);
    assert_eq!(result.answers[1].chosen_label.as_deref(), Some("C"));
}

#[test]
fn test_webp_input_is_read() {
    let result = engine()
        .process(&marked_sheet().webp_bytes(), &options(5))
        .unwrap();
    let answers = result.answers_by_question();
    assert_eq!(answers[&1].as_deref(), Some("A"));
    assert_eq!(answers[&2].as_deref(), Some("C"));
    assert_eq!(answers[&3], None);
    assert_eq!(answers[&4].as_deref(), Some("D"));
}

#[test]
fn test_debug_diagnostics_are_stored() {
    let storage = Arc::new(MockDebugStorage::new());
    let engine = engine().with_debug_storage(storage.clone());

    let result = engine
        .process(&marked_sheet().png_bytes(), &debug_options(5))
        .unwrap();

    assert_eq!(storage.labels(), ["roi", "binary", "nogrid"]);
    assert!(storage.saved().iter().all(|s| s.format == "jpg"));
    assert_eq!(
        result.diagnostics.get(&DiagnosticKind::RegionOverlay).map(String::as_str),
        Some("mock://roi/1.jpg")
    );
    assert_eq!(result.diagnostics.len(), 3);
    // Diagnostics never change the answers.
    let plain = engine
        .process(&marked_sheet().png_bytes(), &options(5))
        .unwrap();
    assert_eq!(plain.answers, result.answers);
    assert_eq!(storage.saved().len(), 3);
}

#[test]
fn test_debug_without_storage_is_silent() {
    let result = engine()
        .process(&marked_sheet().png_bytes(), &debug_options(5))
        .unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.question_count(), 5);
}

#[test]
fn test_storage_failure_omits_label() {
    let storage = Arc::new(FailingDebugStorage::for_label("binary"));
    let engine = engine().with_debug_storage(storage.clone());

    let result = engine
        .process(&marked_sheet().png_bytes(), &debug_options(5))
        .unwrap();

    assert_eq!(result.question_count(), 5);
    assert!(!result.diagnostics.contains_key(&DiagnosticKind::Binary));
    assert!(result.diagnostics.contains_key(&DiagnosticKind::RegionOverlay));
    assert!(result.diagnostics.contains_key(&DiagnosticKind::GridSuppressed));
    assert_eq!(storage.saved().len(), 2);
}

#[test]
fn test_total_storage_failure_still_reads() {
    let engine = engine().with_debug_storage(Arc::new(FailingDebugStorage::always()));
    let result = engine
        .process(&marked_sheet().png_bytes(), &debug_options(5))
        .unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.answers[0].chosen_label.as_deref(), Some("A"));
}

#[test]
fn test_small_image_is_validation_error() {
    let sheet = SyntheticSheetBuilder::new(5, &LABELS)
        .page_size(640, 480)
        .grid(60, 40, 520, 400);
    let err = engine().process(&sheet.png_bytes(), &options(5)).unwrap_err();

    assert!(matches!(err, OmrError::ImageTooSmall { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_smaller_minimum_accepts_small_image() {
    let config = EngineConfig {
        min_width: 640,
        min_height: 480,
        ..EngineConfig::default()
    };
    let sheet = SyntheticSheetBuilder::new(5, &LABELS)
        .page_size(640, 480)
        .grid(60, 40, 520, 400)
        .mark(3, "B");

    let result = OmrEngine::new(config)
        .unwrap()
        .process(&sheet.png_bytes(), &options(5))
        .unwrap();
    assert_eq!(result.answers[2].chosen_label.as_deref(), Some("B"));
}

#[test]
fn test_undecodable_bytes_are_validation_error() {
    let err = engine()
        .process(&[0x00, 0x01, 0x02, 0x03], &options(5))
        .unwrap_err();
    assert!(matches!(err, OmrError::ImageDecode(_)));
    assert!(err.is_validation());
}

#[test]
fn test_blank_page_is_detection_error() {
    let page = image::GrayImage::from_pixel(1000, 800, image::Luma([255]));
    let mut bytes = Vec::new();
    page.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    let err = engine().process(&bytes, &options(5)).unwrap_err();

    assert!(matches!(err, OmrError::GridNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Detection);
}

#[test]
fn test_manual_region_outside_image_rejected() {
    let options = ProcessingOptions::builder()
        .question_count(5)
        .choice_labels(LABELS)
        .mode(DetectionMode::ManualRegion)
        .region(Region::new(900, 700, 300, 300).unwrap())
        .build()
        .unwrap();
    let err = engine()
        .process(&marked_sheet().png_bytes(), &options)
        .unwrap_err();
    assert!(matches!(err, OmrError::InvalidRegion { .. }));
}

#[test]
fn test_ruled_candidate_beats_plain_rectangle() {
    let binary = SyntheticBinaryBuilder::new(400, 300)
        .hollow_rect(10, 10, 180, 130, 3)
        .ruled_rect(210, 140, 180, 150, 3, 5, 4)
        .build();

    let region = RegionLocator::default().search(&binary).unwrap();
    assert_eq!(region, Region::new(210, 140, 180, 150).unwrap());
}

#[test]
fn test_all_correct_grading_roundtrip() {
    let result = engine()
        .process(&marked_sheet().png_bytes(), &options(5))
        .unwrap();

    // Key built from the detected answers, blanks excluded.
    let questions: Vec<_> = result
        .answers_by_question()
        .into_iter()
        .filter_map(|(number, label)| {
            label.map(|l| KeyQuestion {
                number,
                correct_label: l.to_lowercase(),
                points: 2.0,
            })
        })
        .collect();
    let key = AnswerKey {
        id: "exam-1".into(),
        name: "Synthetic".into(),
        questions,
        passing_score: 100.0,
    };

    let correction = grade(&result, &key);
    assert_eq!(correction.correct_count, 3);
    assert!((correction.score - 6.0).abs() < f64::EPSILON);
    assert!((correction.percentage - 100.0).abs() < f64::EPSILON);
    assert!(correction.passed);
    assert_eq!(correction.blank_questions, [3, 5]);
}

#[test]
fn test_engine_as_sheet_reader() {
    let engine = engine();
    let reader: &dyn SheetReader = &engine;
    let result = reader
        .read(&marked_sheet().png_bytes(), &options(5))
        .unwrap();
    assert_eq!(result.question_count(), 5);
}

#[test]
fn test_concurrent_reads_agree() {
    let engine = Arc::new(engine());
    let bytes = Arc::new(marked_sheet().png_bytes());
    let options = options(5);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let bytes = Arc::clone(&bytes);
                let options = options.clone();
                scope.spawn(move || engine.process(&bytes, &options).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in &results[1..] {
        assert_eq!(result.answers, results[0].answers);
    }
}

#[test]
fn test_result_serializes_to_json() {
    let result = engine()
        .process(&marked_sheet().png_bytes(), &options(5))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["answers"][0]["question_number"], 1);
    assert_eq!(json["answers"][0]["chosen_label"], "A");
    assert_eq!(json["answers"][0]["verdict"], "clear");
    assert_eq!(json["answers"][2]["verdict"], "blank");
    assert!(json["answers"][2]["chosen_label"].is_null());
    assert!(json["answers"][0]["densities"]["A"].is_number());
    assert!(json.get("diagnostics").is_none());
}
