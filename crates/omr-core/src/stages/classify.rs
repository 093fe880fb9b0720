//! Answer classification from per-choice densities.
//!
//! Verdicts are assigned by an ordered decision table; the first matching
//! rule wins and [`QualityVerdict::Clear`] applies when none match.

use std::cmp::Ordering;

use crate::domain::{AnswerRecord, DensityMap, QualityVerdict};

/// Thresholds for verdict assignment.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Best density must exceed the row mean times this to count as a mark.
    pub marked_ratio: f64,
    /// Runner-up over best above this means more than one mark.
    pub multiple_ratio: f64,
    /// Confidence below this is reported as low confidence.
    pub low_confidence: f64,
    /// Absolute floor for the best density; anything lower is blank.
    pub min_mark_density: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            marked_ratio: 1.5,
            multiple_ratio: 0.75,
            low_confidence: 0.15,
            min_mark_density: 0.01,
        }
    }
}

/// Summary of one question's densities.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkStatistics {
    /// Label with the highest density (first in choice order on ties).
    pub best_label: Option<String>,
    /// Highest density.
    pub best: f64,
    /// Second-highest density, 0.0 with fewer than two choices.
    pub second: f64,
    /// Mean density over all choices.
    pub average: f64,
    /// `(best - second) / best`, or 0.0 when `best` is 0. Not rounded.
    pub confidence: f64,
}

impl MarkStatistics {
    /// Computes statistics for a density map.
    #[must_use]
    pub fn from_densities(densities: &DensityMap) -> Self {
        let mut ranked: Vec<(&str, f64)> = densities.iter().collect();
        // Stable: equal densities keep choice order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let best_label = ranked.first().map(|(label, _)| (*label).to_string());
        let best = ranked.first().map_or(0.0, |(_, d)| *d);
        let second = ranked.get(1).map_or(0.0, |(_, d)| *d);
        let confidence = if best > 0.0 {
            (best - second) / best
        } else {
            0.0
        };

        Self {
            best_label,
            best,
            second,
            average: densities.mean(),
            confidence,
        }
    }

    /// Returns true if the best choice stands out from the row average.
    #[must_use]
    pub fn is_marked(&self, config: &ClassifierConfig) -> bool {
        self.best > self.average * config.marked_ratio
    }

    /// Returns true if the runner-up is close enough to count as a second mark.
    #[must_use]
    pub fn is_multiple(&self, config: &ClassifierConfig) -> bool {
        self.best > 0.0 && self.second / self.best > config.multiple_ratio
    }
}

/// One row of the decision table.
pub struct VerdictRule {
    /// Rule name for diagnostics.
    pub name: &'static str,
    /// Predicate over the statistics.
    pub applies: fn(&MarkStatistics, &ClassifierConfig) -> bool,
    /// Verdict when the predicate holds.
    pub verdict: QualityVerdict,
}

impl std::fmt::Debug for VerdictRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerdictRule")
            .field("name", &self.name)
            .field("verdict", &self.verdict)
            .finish_non_exhaustive()
    }
}

/// Verdict rules in priority order. Blank must precede multiple so two
/// near-zero, near-equal densities read as blank.
pub const DECISION_TABLE: [VerdictRule; 3] = [
    VerdictRule {
        name: "blank",
        applies: |s, c| !s.is_marked(c) || s.best < c.min_mark_density,
        verdict: QualityVerdict::Blank,
    },
    VerdictRule {
        name: "multiple",
        applies: |s, c| s.is_multiple(c),
        verdict: QualityVerdict::Multiple,
    },
    VerdictRule {
        name: "low_confidence",
        applies: |s, c| s.confidence < c.low_confidence,
        verdict: QualityVerdict::LowConfidence,
    },
];

/// Turns density maps into answer records.
#[derive(Debug, Clone, Default)]
pub struct AnswerClassifier {
    config: ClassifierConfig,
}

impl AnswerClassifier {
    /// Creates a classifier with the given thresholds.
    #[must_use]
    pub const fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// First matching verdict in [`DECISION_TABLE`], else clear.
    #[must_use]
    pub fn decide(&self, stats: &MarkStatistics) -> QualityVerdict {
        DECISION_TABLE
            .iter()
            .find(|rule| (rule.applies)(stats, &self.config))
            .map_or(QualityVerdict::Clear, |rule| rule.verdict)
    }

    /// Classifies one question.
    #[must_use]
    pub fn classify(&self, question_number: u32, densities: DensityMap) -> AnswerRecord {
        let stats = MarkStatistics::from_densities(&densities);
        let verdict = self.decide(&stats);
        let chosen_label = match verdict {
            QualityVerdict::Blank => None,
            _ => stats.best_label,
        };

        AnswerRecord {
            question_number,
            chosen_label,
            confidence: round2(stats.confidence),
            verdict,
            densities,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
