//! Scoring a detection result against an answer key.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::domain::{AnswerKey, AnswerRecord, DetectionResult, QualityVerdict};

/// A scorable answer that does not match the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingMistake {
    /// Question number.
    pub question: u32,
    /// Detected label.
    pub marked: Option<String>,
    /// Expected label.
    pub correct: String,
}

/// Why an answer needs a human look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    /// Nothing marked.
    Blank,
    /// More than one mark.
    Multiple,
    /// Weak mark.
    LowConfidence,
}

impl ReviewReason {
    /// Review reason for a verdict, `None` for clear answers.
    #[must_use]
    pub const fn for_verdict(verdict: QualityVerdict) -> Option<Self> {
        match verdict {
            QualityVerdict::Clear => None,
            QualityVerdict::Blank => Some(Self::Blank),
            QualityVerdict::Multiple => Some(Self::Multiple),
            QualityVerdict::LowConfidence => Some(Self::LowConfidence),
        }
    }
}

/// An answer flagged for review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    /// Question number.
    pub question: u32,
    /// Why it was flagged.
    pub reason: ReviewReason,
    /// Detection confidence.
    pub confidence: f64,
}

/// Outcome of grading one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamCorrection {
    /// Identifier of the key used.
    pub answer_key_id: String,
    /// Detected label per question.
    pub detected: BTreeMap<u32, Option<String>>,
    /// Number of correct answers.
    pub correct_count: u32,
    /// Scorable answers that were wrong.
    pub errors: Vec<GradingMistake>,
    /// Questions whose verdict is not clear.
    pub invalid_questions: Vec<u32>,
    /// Questions read as blank.
    pub blank_questions: Vec<u32>,
    /// Details for every question in `invalid_questions`.
    pub review: Vec<ReviewItem>,
    /// Points earned.
    pub score: f64,
    /// Score as a percentage of the key's total, rounded to 2 dp.
    pub percentage: f64,
    /// Whether `percentage` reaches the key's passing score.
    pub passed: bool,
}

/// Grades `result` against `key`.
///
/// Answers to questions missing from the key are ignored. Only clear and
/// low-confidence answers can earn points; labels compare case-insensitively.
#[must_use]
pub fn grade(result: &DetectionResult, key: &AnswerKey) -> ExamCorrection {
    let mut correct_count = 0;
    let mut errors = Vec::new();
    let mut invalid_questions = Vec::new();
    let mut review = Vec::new();
    let mut score = 0.0;

    for answer in &result.answers {
        let Some(question) = key.question(answer.question_number) else {
            continue;
        };

        if let Some(reason) = ReviewReason::for_verdict(answer.verdict) {
            invalid_questions.push(answer.question_number);
            review.push(ReviewItem {
                question: answer.question_number,
                reason,
                confidence: answer.confidence,
            });
        }

        if !answer.is_scorable() {
            continue;
        }
        if question.is_correct(answer.chosen_label.as_deref()) {
            correct_count += 1;
            score += question.points;
        } else {
            errors.push(mistake(answer, &question.correct_label));
        }
    }

    let total = key.total_points();
    let percentage = if total > 0.0 {
        round2(score / total * 100.0)
    } else {
        0.0
    };
    let passed = percentage >= key.passing_score;
    debug!(
        "Graded against key {}: {score}/{total} points ({percentage}%)",
        key.id
    );

    ExamCorrection {
        answer_key_id: key.id.clone(),
        detected: result.answers_by_question(),
        correct_count,
        errors,
        invalid_questions,
        blank_questions: result.flags().blank,
        review,
        score,
        percentage,
        passed,
    }
}

fn mistake(answer: &AnswerRecord, correct: &str) -> GradingMistake {
    GradingMistake {
        question: answer.question_number,
        marked: answer.chosen_label.clone(),
        correct: correct.to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
