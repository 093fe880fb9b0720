//! Core domain types for answer-sheet reading.

mod answer;
mod answer_key;
mod options;
mod reader;
mod region;
mod result;

pub use answer::{AnswerRecord, DensityMap, QualityVerdict};
pub use answer_key::{AnswerKey, KeyQuestion};
pub use options::{DetectionMode, ProcessingOptions, ProcessingOptionsBuilder, MAX_QUESTIONS};
pub use reader::SheetReader;
pub use region::Region;
pub use result::{DetectionResult, DiagnosticKind, QualityFlags};
