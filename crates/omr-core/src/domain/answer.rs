//! Per-question detection results.

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

/// Classification outcome for a question's detected mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityVerdict {
    /// One choice stands out clearly.
    Clear,
    /// A choice stands out, but only narrowly.
    LowConfidence,
    /// No choice is marked.
    Blank,
    /// Two or more choices are marked about equally.
    Multiple,
}

impl QualityVerdict {
    /// Trustworthiness rank for review ordering: CLEAR > LOW_CONFIDENCE > BLANK = MULTIPLE.
    #[must_use]
    pub const fn trust_rank(self) -> u8 {
        match self {
            Self::Clear => 2,
            Self::LowConfidence => 1,
            Self::Blank | Self::Multiple => 0,
        }
    }

    /// Returns true if an answer with this verdict may be scored as correct.
    #[must_use]
    pub const fn is_scorable(self) -> bool {
        matches!(self, Self::Clear | Self::LowConfidence)
    }
}

/// Ink density per choice label for one question, in choice order.
///
/// Serializes as a JSON object that preserves choice order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityMap {
    entries: Vec<(String, f64)>,
}

impl DensityMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a density for a label. Densities are clamped to [0, 1].
    pub fn insert(&mut self, label: impl Into<String>, density: f64) {
        let label = label.into();
        let density = if density.is_finite() {
            density.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            entry.1 = density;
        } else {
            self.entries.push((label, density));
        }
    }

    /// Density for a label, if present.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, d)| *d)
    }

    /// Iterates `(label, density)` pairs in choice order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, d)| (l.as_str(), *d))
    }

    /// Number of choices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no choices are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arithmetic mean of all densities, 0.0 when empty.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().map(|(_, d)| d).sum::<f64>() / self.entries.len() as f64
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for DensityMap {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, density) in iter {
            map.insert(label, density);
        }
        map
    }
}

impl Serialize for DensityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(l, d)| (l, d)))
    }
}

/// Detected answer for a single question.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnswerRecord {
    /// Question number, starting at 1.
    pub question_number: u32,
    /// Chosen label. Absent only when the verdict is [`QualityVerdict::Blank`].
    pub chosen_label: Option<String>,
    /// Relative margin of the best choice over the runner-up, rounded to 2 dp.
    pub confidence: f64,
    /// Quality classification.
    pub verdict: QualityVerdict,
    /// Raw ink densities that justify the verdict.
    pub densities: DensityMap,
}

impl AnswerRecord {
    /// Returns true if this answer may be scored as correct.
    #[must_use]
    pub const fn is_scorable(&self) -> bool {
        self.verdict.is_scorable()
    }

    /// Returns true if a human should look at this answer.
    #[must_use]
    pub const fn needs_review(&self) -> bool {
        !matches!(self.verdict, QualityVerdict::Clear)
    }
}
