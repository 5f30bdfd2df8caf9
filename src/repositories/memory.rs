// src/repositories/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::{QuizError, QuizResult},
    models::{
        answer::{NewAnswer, ParticipantAnswer, RecordedAnswer},
        invitation::QuizParticipant,
        quiz::{Choice, CreateQuizRequest, Question, QuestionWithChoices, Quiz, QuizStructure},
        user::{NewUser, Participant, User},
    },
    repositories::{
        ActivatedAccount, JournalRepository, LedgerRepository, QuizRepository, UserRepository,
    },
    services::scoring::Tally,
};

/// In-process store used by the test-suite and for running without PostgreSQL.
///
/// One mutex guards all tables, so every trait method is a serializable unit
/// and the unique constraints of the SQL schema are checked under the lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    participants: BTreeMap<i64, Participant>,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, Question>,
    choices: BTreeMap<i64, Choice>,
    ledger: BTreeMap<i64, QuizParticipant>,
    answers: BTreeMap<i64, ParticipantAnswer>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn entry_by_token(&self, token: &str) -> Option<&QuizParticipant> {
        self.ledger
            .values()
            .find(|e| e.invitation_token.as_deref() == Some(token))
    }

    fn user_of_participant(&self, participant_id: i64) -> Option<&User> {
        self.participants
            .get(&participant_id)
            .and_then(|p| self.users.get(&p.user_id))
    }

    fn tally(&self, participant_id: i64, quiz_id: i64) -> Tally {
        let total_questions = self
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .count() as i64;

        let answers: Vec<&ParticipantAnswer> = self
            .answers
            .values()
            .filter(|a| a.participant_id == participant_id && a.quiz_id == quiz_id)
            .collect();

        let correct = answers
            .iter()
            .filter(|a| {
                self.choices
                    .get(&a.selected_choice_id)
                    .is_some_and(|c| c.is_correct)
            })
            .count() as i64;

        Tally {
            total_questions,
            answered: answers.len() as i64,
            correct,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> QuizResult<User> {
        let mut t = self.tables.lock().await;

        if t.users.values().any(|u| u.username == user.username) {
            return Err(QuizError::Validation(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        let row = User {
            id: t.next_id(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            user_type: user.user_type.as_str().to_string(),
            is_active: user.is_active,
            created_at: Utc::now(),
        };
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_id(&self, id: i64) -> QuizResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> QuizResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> QuizResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn ensure_participant(&self, user_id: i64) -> QuizResult<Participant> {
        let mut t = self.tables.lock().await;

        if let Some(existing) = t.participants.values().find(|p| p.user_id == user_id) {
            return Ok(existing.clone());
        }
        if !t.users.contains_key(&user_id) {
            return Err(QuizError::NotFound("User"));
        }

        let row = Participant {
            id: t.next_id(),
            user_id,
            created_at: Utc::now(),
        };
        t.participants.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_participant_by_user(&self, user_id: i64) -> QuizResult<Option<Participant>> {
        let t = self.tables.lock().await;
        Ok(t.participants.values().find(|p| p.user_id == user_id).cloned())
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn create_quiz(
        &self,
        creator_id: i64,
        draft: &CreateQuizRequest,
    ) -> QuizResult<QuizStructure> {
        let mut t = self.tables.lock().await;

        let quiz = Quiz {
            id: t.next_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            creator_id,
            created_at: Utc::now(),
        };
        t.quizzes.insert(quiz.id, quiz.clone());

        let mut questions = Vec::with_capacity(draft.questions.len());
        for (q_pos, q) in draft.questions.iter().enumerate() {
            let question = Question {
                id: t.next_id(),
                quiz_id: quiz.id,
                text: q.text.clone(),
                position: q_pos as i32,
            };
            t.questions.insert(question.id, question.clone());

            let mut choices = Vec::with_capacity(q.choices.len());
            for (c_pos, c) in q.choices.iter().enumerate() {
                let choice = Choice {
                    id: t.next_id(),
                    question_id: question.id,
                    text: c.text.clone(),
                    is_correct: c.is_correct,
                    position: c_pos as i32,
                };
                t.choices.insert(choice.id, choice.clone());
                choices.push(choice);
            }

            questions.push(QuestionWithChoices { question, choices });
        }

        Ok(QuizStructure { quiz, questions })
    }

    async fn find_quiz(&self, id: i64) -> QuizResult<Option<Quiz>> {
        Ok(self.tables.lock().await.quizzes.get(&id).cloned())
    }

    async fn list_quizzes_by_creator(&self, creator_id: i64) -> QuizResult<Vec<Quiz>> {
        let t = self.tables.lock().await;
        Ok(t.quizzes
            .values()
            .filter(|q| q.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn list_quizzes_for_participant(&self, participant_id: i64) -> QuizResult<Vec<Quiz>> {
        let t = self.tables.lock().await;
        let mut quizzes: Vec<Quiz> = t
            .ledger
            .values()
            .filter(|e| e.participant_id == participant_id && e.is_activated())
            .filter_map(|e| t.quizzes.get(&e.quiz_id).cloned())
            .collect();
        quizzes.sort_by_key(|q| q.id);
        Ok(quizzes)
    }

    async fn find_question(&self, id: i64) -> QuizResult<Option<Question>> {
        Ok(self.tables.lock().await.questions.get(&id).cloned())
    }

    async fn find_choice(&self, id: i64) -> QuizResult<Option<Choice>> {
        Ok(self.tables.lock().await.choices.get(&id).cloned())
    }

    async fn list_questions(&self, quiz_id: i64) -> QuizResult<Vec<QuestionWithChoices>> {
        let t = self.tables.lock().await;

        let mut questions: Vec<Question> = t
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.position, q.id));

        Ok(questions
            .into_iter()
            .map(|question| {
                let mut choices: Vec<Choice> = t
                    .choices
                    .values()
                    .filter(|c| c.question_id == question.id)
                    .cloned()
                    .collect();
                choices.sort_by_key(|c| (c.position, c.id));
                QuestionWithChoices { question, choices }
            })
            .collect())
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn create_invitation(
        &self,
        participant_id: i64,
        quiz_id: i64,
        token: &str,
        invited_at: DateTime<Utc>,
    ) -> QuizResult<QuizParticipant> {
        let mut t = self.tables.lock().await;

        let duplicate = t
            .ledger
            .values()
            .any(|e| e.participant_id == participant_id && e.quiz_id == quiz_id);
        if duplicate || t.entry_by_token(token).is_some() {
            return Err(QuizError::DuplicateInvitation);
        }
        if !t.participants.contains_key(&participant_id) {
            return Err(QuizError::NotFound("Participant"));
        }
        if !t.quizzes.contains_key(&quiz_id) {
            return Err(QuizError::NotFound("Quiz"));
        }

        let entry = QuizParticipant {
            id: t.next_id(),
            participant_id,
            quiz_id,
            invited_at,
            invitation_token: Some(token.to_string()),
            accepted_at: None,
            started_at: None,
            completed_at: None,
            score: None,
        };
        t.ledger.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_invitation_by_token(&self, token: &str) -> QuizResult<Option<QuizParticipant>> {
        Ok(self.tables.lock().await.entry_by_token(token).cloned())
    }

    async fn find_invitation(
        &self,
        participant_id: i64,
        quiz_id: i64,
    ) -> QuizResult<Option<QuizParticipant>> {
        let t = self.tables.lock().await;
        Ok(t.ledger
            .values()
            .find(|e| e.participant_id == participant_id && e.quiz_id == quiz_id)
            .cloned())
    }

    async fn activate_account(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> QuizResult<ActivatedAccount> {
        let mut t = self.tables.lock().await;

        let mut entry = t.entry_by_token(token).cloned().ok_or(QuizError::InvalidToken)?;

        let mut user = t.user_of_participant(entry.participant_id).cloned().ok_or_else(|| {
            QuizError::Invariant(format!("ledger entry {} has no participant account", entry.id))
        })?;

        if user.is_active {
            return Err(QuizError::AlreadyActive);
        }

        user.password = Some(password_hash.to_string());
        user.is_active = true;
        entry.mark_accepted(now);

        t.users.insert(user.id, user.clone());
        t.ledger.insert(entry.id, entry.clone());

        Ok(ActivatedAccount { user, entry })
    }

    async fn accept_invitation(
        &self,
        participant_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> QuizResult<QuizParticipant> {
        let mut t = self.tables.lock().await;

        let mut entry = t
            .entry_by_token(token)
            .filter(|e| e.participant_id == participant_id)
            .cloned()
            .ok_or(QuizError::InvalidToken)?;

        entry.mark_accepted(now);
        t.ledger.insert(entry.id, entry.clone());

        Ok(entry)
    }
}

#[async_trait]
impl JournalRepository for MemoryStore {
    async fn record_answer(
        &self,
        answer: NewAnswer,
        now: DateTime<Utc>,
    ) -> QuizResult<RecordedAnswer> {
        let mut t = self.tables.lock().await;

        let mut entry = t
            .ledger
            .get(&answer.entry_id)
            .cloned()
            .ok_or_else(|| QuizError::Invariant(format!("ledger entry {} missing", answer.entry_id)))?;

        if entry.participant_id != answer.participant_id || entry.quiz_id != answer.quiz_id {
            return Err(QuizError::Invariant(format!(
                "ledger entry {} does not belong to participant {} in quiz {}",
                entry.id, answer.participant_id, answer.quiz_id
            )));
        }

        let already_answered = t.answers.values().any(|a| {
            a.participant_id == answer.participant_id && a.question_id == answer.question_id
        });
        if already_answered {
            return Err(QuizError::AlreadyAnswered);
        }

        let recorded = ParticipantAnswer {
            id: t.next_id(),
            participant_id: answer.participant_id,
            quiz_id: answer.quiz_id,
            question_id: answer.question_id,
            selected_choice_id: answer.selected_choice_id,
            answered_at: now,
        };
        t.answers.insert(recorded.id, recorded.clone());

        entry.mark_started(now);
        if let Some(score) = t.tally(answer.participant_id, answer.quiz_id).final_score() {
            entry.mark_completed(now, score);
        }
        t.ledger.insert(entry.id, entry.clone());

        Ok(RecordedAnswer {
            answer: recorded,
            entry,
        })
    }

    async fn list_answers(
        &self,
        participant_id: i64,
        quiz_id: i64,
    ) -> QuizResult<Vec<ParticipantAnswer>> {
        let t = self.tables.lock().await;
        Ok(t.answers
            .values()
            .filter(|a| a.participant_id == participant_id && a.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn tally(&self, participant_id: i64, quiz_id: i64) -> QuizResult<Tally> {
        Ok(self.tables.lock().await.tally(participant_id, quiz_id))
    }
}
