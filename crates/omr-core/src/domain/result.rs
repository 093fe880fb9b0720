//! Detection result types.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnswerRecord, QualityVerdict};

/// Labeled diagnostic image emitted during a debug run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Decoded input with the located region outlined.
    RegionOverlay,
    /// Full binarized image.
    Binary,
    /// Extracted region after grid-line suppression.
    GridSuppressed,
}

impl DiagnosticKind {
    /// All kinds, in emission order.
    pub const ALL: [Self; 3] = [Self::RegionOverlay, Self::Binary, Self::GridSuppressed];

    /// Short label handed to the storage collaborator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RegionOverlay => "roi",
            Self::Binary => "binary",
            Self::GridSuppressed => "nogrid",
        }
    }
}

/// Question numbers grouped by problematic verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityFlags {
    /// Questions with no mark.
    pub blank: Vec<u32>,
    /// Questions with more than one mark.
    pub multiple: Vec<u32>,
    /// Questions with a weak mark.
    pub low_confidence: Vec<u32>,
}

/// Complete output of reading one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// One record per question, numbered 1..=question_count in order.
    pub answers: Vec<AnswerRecord>,
    /// Storage locations of diagnostic images, when emitted.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<DiagnosticKind, String>,
}

impl DetectionResult {
    /// Number of questions read.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.answers.len()
    }

    /// Maps question number to chosen label (or `None` when blank).
    #[must_use]
    pub fn answers_by_question(&self) -> BTreeMap<u32, Option<String>> {
        self.answers
            .iter()
            .map(|a| (a.question_number, a.chosen_label.clone()))
            .collect()
    }

    /// Maps question number to confidence.
    #[must_use]
    pub fn confidence_by_question(&self) -> BTreeMap<u32, f64> {
        self.answers
            .iter()
            .map(|a| (a.question_number, a.confidence))
            .collect()
    }

    /// Groups question numbers by blank / multiple / low-confidence verdicts.
    #[must_use]
    pub fn flags(&self) -> QualityFlags {
        let mut flags = QualityFlags::default();
        for answer in &self.answers {
            match answer.verdict {
                QualityVerdict::Blank => flags.blank.push(answer.question_number),
                QualityVerdict::Multiple => flags.multiple.push(answer.question_number),
                QualityVerdict::LowConfidence => {
                    flags.low_confidence.push(answer.question_number);
                }
                QualityVerdict::Clear => {}
            }
        }
        flags
    }

    /// Looks up the record for a question number.
    #[must_use]
    pub fn answer(&self, question_number: u32) -> Option<&AnswerRecord> {
        self.answers
            .iter()
            .find(|a| a.question_number == question_number)
    }
}
