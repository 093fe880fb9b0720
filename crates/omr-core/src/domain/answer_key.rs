//! Answer keys supplied by the correction collaborator.

use serde::{Deserialize, Serialize};

/// Expected answer and point value for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyQuestion {
    /// Question number, starting at 1.
    pub number: u32,
    /// Correct choice label.
    pub correct_label: String,
    /// Points awarded for a correct answer.
    pub points: f64,
}

impl KeyQuestion {
    /// Case-insensitive comparison against a detected label.
    #[must_use]
    pub fn is_correct(&self, chosen: Option<&str>) -> bool {
        chosen.is_some_and(|c| c.to_uppercase() == self.correct_label.to_uppercase())
    }
}

/// Exam answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKey {
    /// Key identifier.
    pub id: String,
    /// Human-readable exam name.
    pub name: String,
    /// Expected answers.
    pub questions: Vec<KeyQuestion>,
    /// Minimum percentage (0-100) required to pass.
    pub passing_score: f64,
}

impl AnswerKey {
    /// Sum of all question points.
    #[must_use]
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Looks up a question by number.
    #[must_use]
    pub fn question(&self, number: u32) -> Option<&KeyQuestion> {
        self.questions.iter().find(|q| q.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_correct_case_insensitive() {
        let q = KeyQuestion {
            number: 1,
            correct_label: "b".into(),
            points: 1.0,
        };
        assert!(q.is_correct(Some("B")));
        assert!(q.is_correct(Some("b")));
        assert!(!q.is_correct(Some("C")));
        assert!(!q.is_correct(None));
    }

    #[test]
    fn test_total_points() {
        let key = AnswerKey {
            id: "k1".into(),
            name: "Quiz".into(),
            questions: vec![
                KeyQuestion {
                    number: 1,
                    correct_label: "A".into(),
                    points: 1.5,
                },
                KeyQuestion {
                    number: 2,
                    correct_label: "B".into(),
                    points: 2.5,
                },
            ],
            passing_score: 60.0,
        };
        assert!((key.total_points() - 4.0).abs() < f64::EPSILON);
        assert!(key.question(2).is_some());
        assert!(key.question(3).is_none());
    }
}
