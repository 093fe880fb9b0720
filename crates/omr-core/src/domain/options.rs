//! Per-invocation processing options.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Region;
use crate::error::{OmrError, Result};

/// Largest question count a single sheet may declare.
pub const MAX_QUESTIONS: u32 = 100;

/// How the answer-grid region is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMode {
    /// Locate the grid automatically.
    #[default]
    Auto,
    /// Use the caller-supplied region verbatim.
    ManualRegion,
}

impl FromStr for DetectionMode {
    type Err = OmrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "MANUAL_REGION" | "MANUAL_ROI" => Ok(Self::ManualRegion),
            other => Err(OmrError::invalid(format!(
                "mode must be AUTO or MANUAL_REGION, got '{other}'"
            ))),
        }
    }
}

/// Validated, immutable options for reading one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingOptions {
    question_count: u32,
    choice_labels: Vec<String>,
    mode: DetectionMode,
    region: Option<Region>,
    debug: bool,
}

impl ProcessingOptions {
    /// Starts building options.
    #[must_use]
    pub fn builder() -> ProcessingOptionsBuilder {
        ProcessingOptionsBuilder::default()
    }

    /// Number of questions on the sheet (1..=100).
    #[must_use]
    pub const fn question_count(&self) -> u32 {
        self.question_count
    }

    /// Ordered choice labels.
    #[must_use]
    pub fn choice_labels(&self) -> &[String] {
        &self.choice_labels
    }

    /// Region detection mode.
    #[must_use]
    pub const fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Caller-supplied region, if any.
    #[must_use]
    pub const fn region(&self) -> Option<Region> {
        self.region
    }

    /// Whether diagnostic images should be emitted.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }
}

/// Builder for [`ProcessingOptions`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ProcessingOptionsBuilder {
    question_count: u32,
    choice_labels: Vec<String>,
    mode: DetectionMode,
    region: Option<Region>,
    debug: bool,
}

impl ProcessingOptionsBuilder {
    /// Sets the number of questions.
    #[must_use]
    pub const fn question_count(mut self, count: u32) -> Self {
        self.question_count = count;
        self
    }

    /// Sets the ordered choice labels.
    #[must_use]
    pub fn choice_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choice_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the detection mode.
    #[must_use]
    pub const fn mode(mut self, mode: DetectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the manual region.
    #[must_use]
    pub const fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Enables or disables diagnostic image emission.
    #[must_use]
    pub const fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Validates and builds the options.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::InvalidOptions`] if the question count is outside
    /// 1..=100, fewer than two choice labels are given, a label is not a
    /// single non-whitespace character, labels repeat, or manual mode has
    /// no region.
    pub fn build(self) -> Result<ProcessingOptions> {
        if self.question_count < 1 || self.question_count > MAX_QUESTIONS {
            return Err(OmrError::invalid(format!(
                "question count must be between 1 and {MAX_QUESTIONS}, got {}",
                self.question_count
            )));
        }

        if self.choice_labels.len() < 2 {
            return Err(OmrError::invalid(format!(
                "at least 2 choice labels are required, got {}",
                self.choice_labels.len()
            )));
        }

        let mut seen = HashSet::with_capacity(self.choice_labels.len());
        for label in &self.choice_labels {
            let mut chars = label.chars();
            let single = matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_whitespace());
            if !single {
                return Err(OmrError::invalid(format!(
                    "choice labels must be single characters, got '{label}'"
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(OmrError::invalid(format!("duplicate choice label '{label}'")));
            }
        }

        if self.mode == DetectionMode::ManualRegion && self.region.is_none() {
            return Err(OmrError::invalid("MANUAL_REGION mode requires a region"));
        }

        Ok(ProcessingOptions {
            question_count: self.question_count,
            choice_labels: self.choice_labels,
            mode: self.mode,
            region: self.region,
            debug: self.debug,
        })
    }
}
