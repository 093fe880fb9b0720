//! OMR Core - Answer-sheet reading pipeline
//!
//! This crate contains the domain types, the detection stages (binarization,
//! grid location, grid-line suppression, cell measurement, classification),
//! the [`OmrEngine`] that runs them in order, and answer-key grading.
//!
//! Diagnostic images are written through the [`ports::DebugStorage`] port;
//! concrete storage lives in `omr-adapters`.

pub mod config;
pub mod domain;
mod engine;
pub mod error;
pub mod grading;
pub mod ports;
pub mod stages;

pub use config::EngineConfig;
pub use domain::{
    AnswerKey, AnswerRecord, DensityMap, DetectionMode, DetectionResult, DiagnosticKind,
    KeyQuestion, ProcessingOptions, QualityFlags, QualityVerdict, Region, SheetReader,
};
pub use engine::OmrEngine;
pub use error::{ErrorKind, OmrError, Result};
pub use grading::{grade, ExamCorrection, GradingMistake, ReviewItem, ReviewReason};
pub use ports::DebugStorage;
