//! Pipeline stages.
//!
//! Each stage is a small struct holding its own config, run in order:
//! binarize, locate, extract, suppress grid lines, measure cells, classify.

mod binarize;
mod cells;
mod classify;
mod contour;
mod locate;
mod morphology;
mod suppress;

pub use binarize::{count_foreground, BinarizeConfig, Binarizer, BACKGROUND, FOREGROUND};
pub use cells::{CellAnalyzer, CellBounds, CellConfig};
pub use classify::{
    AnswerClassifier, ClassifierConfig, MarkStatistics, VerdictRule, DECISION_TABLE,
};
pub use locate::{extract_region, CandidateKind, LocatorConfig, RegionLocator, ScoredCandidate};
pub use suppress::{GridLineSuppressor, SuppressorConfig};
