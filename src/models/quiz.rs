// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// User id of the owning creator.
    pub creator_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'questions' table. Ordered by `position` within a quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub position: i32,
}

/// Represents the 'choices' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    /// Scoring treats an answer as correct iff its selected choice carries this flag.
    pub is_correct: bool,
    pub position: i32,
}

/// A question with its ordered choices.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithChoices {
    pub question: Question,
    pub choices: Vec<Choice>,
}

/// A quiz with its full question/choice structure.
#[derive(Debug, Clone, Serialize)]
pub struct QuizStructure {
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithChoices>,
}

/// Choice as shown to clients. `is_correct` is only populated for the owning creator.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChoiceView {
    pub id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: i64,
    pub text: String,
    pub choices: Vec<ChoiceView>,
    /// The calling participant's recorded answer, if any.
    pub selected_choice_id: Option<i64>,
}

/// DTO for `GET /quizzes/{id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionView>,
}

/// DTO for quiz listings.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
        }
    }
}

/// DTO for creating a quiz together with its questions and choices.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(min = 1, message = "A quiz needs at least one question."), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    #[validate(custom(function = validate_choices), nested)]
    pub choices: Vec<CreateChoiceRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateChoiceRequest {
    #[validate(length(min = 1, max = 300))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

fn validate_choices(choices: &[CreateChoiceRequest]) -> Result<(), validator::ValidationError> {
    if choices.is_empty() {
        return Err(validator::ValidationError::new("choices_cannot_be_empty"));
    }
    if !choices.iter().any(|c| c.is_correct) {
        return Err(validator::ValidationError::new("no_correct_choice"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(choices: Vec<(&str, bool)>) -> CreateQuestionRequest {
        CreateQuestionRequest {
            text: "Are we in the Matrix?".into(),
            choices: choices
                .into_iter()
                .map(|(text, is_correct)| CreateChoiceRequest {
                    text: text.into(),
                    is_correct,
                })
                .collect(),
        }
    }

    #[test]
    fn test_question_requires_a_correct_choice() {
        assert!(question(vec![("Yes", false), ("No", false)]).validate().is_err());
        assert!(question(vec![("Yes", true), ("No", false)]).validate().is_ok());
    }

    #[test]
    fn test_quiz_requires_questions() {
        let quiz = CreateQuizRequest {
            title: "Reality check".into(),
            description: String::new(),
            questions: vec![],
        };
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_nested_question_errors_surface() {
        let quiz = CreateQuizRequest {
            title: "Reality check".into(),
            description: String::new(),
            questions: vec![question(vec![])],
        };
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_rejected_payload_is_reported_with_its_value() {
        let quiz = CreateQuizRequest {
            title: "Reality check".into(),
            description: String::new(),
            questions: vec![question(vec![("Yes", false)])],
        };
        let errors = quiz.validate().unwrap_err();
        let report = serde_json::to_string(&errors).unwrap();
        assert!(report.contains("no_correct_choice"));
        assert!(report.contains("Yes"));
    }
}
