// src/services/scoring.rs

/// Answer counts for one participant in one quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub total_questions: i64,
    pub answered: i64,
    /// Answers whose selected choice is flagged correct.
    pub correct: i64,
}

impl Tally {
    /// Every question has an answer. An empty quiz is never complete.
    pub fn is_complete(&self) -> bool {
        self.total_questions > 0 && self.answered >= self.total_questions
    }

    pub fn percent_complete(&self) -> f64 {
        percent(self.answered, self.total_questions)
    }

    /// Score over the answered subset.
    pub fn current_score(&self) -> f64 {
        percent(self.correct, self.answered)
    }

    /// Score over the whole quiz, available once complete.
    pub fn final_score(&self) -> Option<f64> {
        self.is_complete()
            .then(|| percent(self.correct, self.total_questions))
    }
}

/// `100 * part / whole`, or 0 when `whole` is 0.
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}
