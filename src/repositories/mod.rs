// src/repositories/mod.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::QuizResult,
    models::{
        answer::{NewAnswer, ParticipantAnswer, RecordedAnswer},
        invitation::QuizParticipant,
        quiz::{Choice, CreateQuizRequest, Question, QuestionWithChoices, Quiz, QuizStructure},
        user::{NewUser, Participant, User},
    },
    services::scoring::Tally,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Accounts and participant profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Validation` when the username is taken.
    async fn create_user(&self, user: NewUser) -> QuizResult<User>;
    async fn find_user_by_id(&self, id: i64) -> QuizResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> QuizResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> QuizResult<Option<User>>;
    /// Creates the profile for `user_id`, or returns the existing one.
    async fn ensure_participant(&self, user_id: i64) -> QuizResult<Participant>;
    async fn find_participant_by_user(&self, user_id: i64) -> QuizResult<Option<Participant>>;
}

/// Read access to quiz structure, plus whole-quiz creation.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create_quiz(&self, creator_id: i64, draft: &CreateQuizRequest)
    -> QuizResult<QuizStructure>;
    async fn find_quiz(&self, id: i64) -> QuizResult<Option<Quiz>>;
    async fn list_quizzes_by_creator(&self, creator_id: i64) -> QuizResult<Vec<Quiz>>;
    /// Quizzes with an accepted invitation for the participant.
    async fn list_quizzes_for_participant(&self, participant_id: i64) -> QuizResult<Vec<Quiz>>;
    async fn find_question(&self, id: i64) -> QuizResult<Option<Question>>;
    async fn find_choice(&self, id: i64) -> QuizResult<Option<Choice>>;
    async fn list_questions(&self, quiz_id: i64) -> QuizResult<Vec<QuestionWithChoices>>;
}

/// The invitation ledger (`quiz_participants`).
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Fails with `DuplicateInvitation` if (participant, quiz) already has an entry.
    async fn create_invitation(
        &self,
        participant_id: i64,
        quiz_id: i64,
        token: &str,
        invited_at: DateTime<Utc>,
    ) -> QuizResult<QuizParticipant>;

    async fn find_invitation_by_token(&self, token: &str) -> QuizResult<Option<QuizParticipant>>;

    async fn find_invitation(
        &self,
        participant_id: i64,
        quiz_id: i64,
    ) -> QuizResult<Option<QuizParticipant>>;

    /// Atomically: sets the credential, activates the account, burns the token
    /// and stamps acceptance.
    ///
    /// Fails with `InvalidToken` when no entry holds `token` and with
    /// `AlreadyActive` when the owning account is already active.
    async fn activate_account(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> QuizResult<ActivatedAccount>;

    /// Accepts a further invitation for an already active participant.
    /// The token must belong to `participant_id`, else `InvalidToken`.
    async fn accept_invitation(
        &self,
        participant_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> QuizResult<QuizParticipant>;
}

/// The answer journal (`participant_answers`).
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Atomically: inserts the answer, starts the clock on the ledger entry and
    /// stamps completion plus score once every question is answered.
    ///
    /// Fails with `AlreadyAnswered` if the participant already answered the question.
    async fn record_answer(&self, answer: NewAnswer, now: DateTime<Utc>)
    -> QuizResult<RecordedAnswer>;

    async fn list_answers(
        &self,
        participant_id: i64,
        quiz_id: i64,
    ) -> QuizResult<Vec<ParticipantAnswer>>;

    async fn tally(&self, participant_id: i64, quiz_id: i64) -> QuizResult<Tally>;
}

/// Everything the service layer needs from storage.
pub trait Store: UserRepository + QuizRepository + LedgerRepository + JournalRepository {}

impl<T> Store for T where T: UserRepository + QuizRepository + LedgerRepository + JournalRepository {}

pub type SharedStore = Arc<dyn Store>;

/// Outcome of a successful activation.
#[derive(Debug, Clone)]
pub struct ActivatedAccount {
    pub user: User,
    pub entry: QuizParticipant,
}
