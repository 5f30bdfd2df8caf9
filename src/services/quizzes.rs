// src/services/quizzes.rs

use std::collections::HashMap;

use crate::{
    error::{QuizError, QuizResult},
    models::{
        quiz::{ChoiceView, CreateQuizRequest, QuestionView, QuizDetail, QuizStructure, QuizSummary},
        user::{UserIdentity, UserType},
    },
    repositories::Store,
    services::access::{authorize_identity, require_owned_quiz, resolve_participant},
};

pub async fn create_quiz(
    store: &dyn Store,
    creator: &UserIdentity,
    req: &CreateQuizRequest,
) -> QuizResult<QuizStructure> {
    if creator.role != UserType::Creator {
        return Err(QuizError::CreatorOnly);
    }

    let created = store.create_quiz(creator.user_id, req).await?;
    tracing::info!(
        "Quiz {} created by {} with {} questions",
        created.quiz.id,
        creator.user_id,
        created.questions.len()
    );
    Ok(created)
}

/// Creators see their own quizzes; participants see quizzes they have accepted.
pub async fn list_quizzes(store: &dyn Store, identity: &UserIdentity) -> QuizResult<Vec<QuizSummary>> {
    let quizzes = match identity.role {
        UserType::Creator => store.list_quizzes_by_creator(identity.user_id).await?,
        UserType::Participant => {
            let participant = resolve_participant(store, identity).await?;
            store.list_quizzes_for_participant(participant.id).await?
        }
    };

    Ok(quizzes.iter().map(QuizSummary::from).collect())
}

/// Quiz with questions and choices.
///
/// Owners see correctness flags. Participants see their own selected choice per
/// question and never the flags.
pub async fn quiz_detail(
    store: &dyn Store,
    identity: &UserIdentity,
    quiz_id: i64,
) -> QuizResult<QuizDetail> {
    let (quiz, selections, reveal_answers) = match identity.role {
        UserType::Creator => {
            let quiz = require_owned_quiz(store, identity, quiz_id).await?;
            (quiz, HashMap::new(), true)
        }
        UserType::Participant => {
            let (quiz, activated) = authorize_identity(store, identity, quiz_id).await?;
            let selections: HashMap<i64, i64> = store
                .list_answers(activated.participant.id, quiz.id)
                .await?
                .into_iter()
                .map(|a| (a.question_id, a.selected_choice_id))
                .collect();
            (quiz, selections, false)
        }
    };

    let questions = store
        .list_questions(quiz.id)
        .await?
        .into_iter()
        .map(|q| QuestionView {
            id: q.question.id,
            text: q.question.text,
            selected_choice_id: selections.get(&q.question.id).copied(),
            choices: q
                .choices
                .into_iter()
                .map(|c| ChoiceView {
                    id: c.id,
                    text: c.text,
                    is_correct: reveal_answers.then_some(c.is_correct),
                })
                .collect(),
        })
        .collect();

    Ok(QuizDetail {
        id: quiz.id,
        title: quiz.title,
        description: quiz.description,
        questions,
    })
}
