// src/repositories/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

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

/// PostgreSQL-backed store. Multi-step mutations run in one transaction and
/// lock the ledger row with `FOR UPDATE`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Writes back every mutable ledger column.
async fn save_entry(conn: &mut PgConnection, entry: &QuizParticipant) -> QuizResult<()> {
    sqlx::query(
        r#"
        UPDATE quiz_participants
        SET invitation_token = $2,
            accepted_at = $3,
            started_at = $4,
            completed_at = $5,
            score = $6
        WHERE id = $1
        "#,
    )
    .bind(entry.id)
    .bind(&entry.invitation_token)
    .bind(entry.accepted_at)
    .bind(entry.started_at)
    .bind(entry.completed_at)
    .bind(entry.score)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn tally_on(conn: &mut PgConnection, participant_id: i64, quiz_id: i64) -> QuizResult<Tally> {
    let (total_questions, answered, correct): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM questions WHERE quiz_id = $2) AS total_questions,
            (SELECT COUNT(*) FROM participant_answers
                WHERE participant_id = $1 AND quiz_id = $2) AS answered,
            (SELECT COUNT(*) FROM participant_answers pa
                JOIN choices c ON c.id = pa.selected_choice_id
                WHERE pa.participant_id = $1 AND pa.quiz_id = $2 AND c.is_correct) AS correct
        "#,
    )
    .bind(participant_id)
    .bind(quiz_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Tally {
        total_questions,
        answered,
        correct,
    })
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> QuizResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, user_type, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.user_type.as_str())
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                QuizError::Validation(format!("Username '{}' already exists", user.username))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                QuizError::from(e)
            }
        })
    }

    async fn find_user_by_id(&self, id: i64) -> QuizResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> QuizResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> QuizResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 ORDER BY id LIMIT 1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn ensure_participant(&self, user_id: i64) -> QuizResult<Participant> {
        sqlx::query("INSERT INTO participants (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.find_participant_by_user(user_id)
            .await?
            .ok_or_else(|| QuizError::Invariant(format!("participant for user {} vanished", user_id)))
    }

    async fn find_participant_by_user(&self, user_id: i64) -> QuizResult<Option<Participant>> {
        let participant =
            sqlx::query_as::<_, Participant>("SELECT * FROM participants WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(participant)
    }
}

#[async_trait]
impl QuizRepository for PgStore {
    async fn create_quiz(
        &self,
        creator_id: i64,
        draft: &CreateQuizRequest,
    ) -> QuizResult<QuizStructure> {
        let mut tx = self.pool.begin().await?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, description, creator_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(creator_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(draft.questions.len());
        for (q_pos, q) in draft.questions.iter().enumerate() {
            let question = sqlx::query_as::<_, Question>(
                "INSERT INTO questions (quiz_id, text, position) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(quiz.id)
            .bind(&q.text)
            .bind(q_pos as i32)
            .fetch_one(&mut *tx)
            .await?;

            let mut choices = Vec::with_capacity(q.choices.len());
            for (c_pos, c) in q.choices.iter().enumerate() {
                let choice = sqlx::query_as::<_, Choice>(
                    r#"
                    INSERT INTO choices (question_id, text, is_correct, position)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(question.id)
                .bind(&c.text)
                .bind(c.is_correct)
                .bind(c_pos as i32)
                .fetch_one(&mut *tx)
                .await?;
                choices.push(choice);
            }

            questions.push(QuestionWithChoices { question, choices });
        }

        tx.commit().await?;

        Ok(QuizStructure { quiz, questions })
    }

    async fn find_quiz(&self, id: i64) -> QuizResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quiz)
    }

    async fn list_quizzes_by_creator(&self, creator_id: i64) -> QuizResult<Vec<Quiz>> {
        let quizzes =
            sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE creator_id = $1 ORDER BY id")
                .bind(creator_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(quizzes)
    }

    async fn list_quizzes_for_participant(&self, participant_id: i64) -> QuizResult<Vec<Quiz>> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT q.*
            FROM quizzes q
            JOIN quiz_participants qp ON qp.quiz_id = q.id
            WHERE qp.participant_id = $1 AND qp.accepted_at IS NOT NULL
            ORDER BY q.id
            "#,
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quizzes)
    }

    async fn find_question(&self, id: i64) -> QuizResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    async fn find_choice(&self, id: i64) -> QuizResult<Option<Choice>> {
        let choice = sqlx::query_as::<_, Choice>("SELECT * FROM choices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(choice)
    }

    async fn list_questions(&self, quiz_id: i64) -> QuizResult<Vec<QuestionWithChoices>> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE quiz_id = $1 ORDER BY position, id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let choices = sqlx::query_as::<_, Choice>(
            r#"
            SELECT c.*
            FROM choices c
            JOIN questions q ON q.id = c.question_id
            WHERE q.quiz_id = $1
            ORDER BY c.position, c.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<i64, Vec<Choice>> = HashMap::new();
        for choice in choices {
            by_question.entry(choice.question_id).or_default().push(choice);
        }

        Ok(questions
            .into_iter()
            .map(|question| {
                let choices = by_question.remove(&question.id).unwrap_or_default();
                QuestionWithChoices { question, choices }
            })
            .collect())
    }
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn create_invitation(
        &self,
        participant_id: i64,
        quiz_id: i64,
        token: &str,
        invited_at: DateTime<Utc>,
    ) -> QuizResult<QuizParticipant> {
        sqlx::query_as::<_, QuizParticipant>(
            r#"
            INSERT INTO quiz_participants (participant_id, quiz_id, invited_at, invitation_token)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(participant_id)
        .bind(quiz_id)
        .bind(invited_at)
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                QuizError::DuplicateInvitation
            } else {
                tracing::error!("Failed to create invitation: {:?}", e);
                QuizError::from(e)
            }
        })
    }

    async fn find_invitation_by_token(&self, token: &str) -> QuizResult<Option<QuizParticipant>> {
        let entry = sqlx::query_as::<_, QuizParticipant>(
            "SELECT * FROM quiz_participants WHERE invitation_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn find_invitation(
        &self,
        participant_id: i64,
        quiz_id: i64,
    ) -> QuizResult<Option<QuizParticipant>> {
        let entry = sqlx::query_as::<_, QuizParticipant>(
            "SELECT * FROM quiz_participants WHERE participant_id = $1 AND quiz_id = $2",
        )
        .bind(participant_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn activate_account(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> QuizResult<ActivatedAccount> {
        let mut tx = self.pool.begin().await?;

        // A concurrent activation holding the lock clears the token; this
        // lookup then re-evaluates to no row.
        let mut entry = sqlx::query_as::<_, QuizParticipant>(
            "SELECT * FROM quiz_participants WHERE invitation_token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(QuizError::InvalidToken)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM users u
            JOIN participants p ON p.user_id = u.id
            WHERE p.id = $1
            FOR UPDATE OF u
            "#,
        )
        .bind(entry.participant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            QuizError::Invariant(format!("ledger entry {} has no participant account", entry.id))
        })?;

        if user.is_active {
            return Err(QuizError::AlreadyActive);
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET password = $2, is_active = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        entry.mark_accepted(now);
        save_entry(&mut *tx, &entry).await?;

        tx.commit().await?;

        Ok(ActivatedAccount { user, entry })
    }

    async fn accept_invitation(
        &self,
        participant_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> QuizResult<QuizParticipant> {
        let mut tx = self.pool.begin().await?;

        let mut entry = sqlx::query_as::<_, QuizParticipant>(
            "SELECT * FROM quiz_participants WHERE invitation_token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?
        .filter(|entry| entry.participant_id == participant_id)
        .ok_or(QuizError::InvalidToken)?;

        entry.mark_accepted(now);
        save_entry(&mut *tx, &entry).await?;

        tx.commit().await?;

        Ok(entry)
    }
}

#[async_trait]
impl JournalRepository for PgStore {
    async fn record_answer(
        &self,
        answer: NewAnswer,
        now: DateTime<Utc>,
    ) -> QuizResult<RecordedAnswer> {
        let mut tx = self.pool.begin().await?;

        // Serializes submissions of one participant within one quiz so the
        // completion check below sees every committed answer.
        let mut entry = sqlx::query_as::<_, QuizParticipant>(
            "SELECT * FROM quiz_participants WHERE id = $1 FOR UPDATE",
        )
        .bind(answer.entry_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| QuizError::Invariant(format!("ledger entry {} missing", answer.entry_id)))?;

        if entry.participant_id != answer.participant_id || entry.quiz_id != answer.quiz_id {
            return Err(QuizError::Invariant(format!(
                "ledger entry {} does not belong to participant {} in quiz {}",
                entry.id, answer.participant_id, answer.quiz_id
            )));
        }

        let recorded = sqlx::query_as::<_, ParticipantAnswer>(
            r#"
            INSERT INTO participant_answers
                (participant_id, quiz_id, question_id, selected_choice_id, answered_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(answer.participant_id)
        .bind(answer.quiz_id)
        .bind(answer.question_id)
        .bind(answer.selected_choice_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                QuizError::AlreadyAnswered
            } else {
                QuizError::from(e)
            }
        })?;

        entry.mark_started(now);

        let tally = tally_on(&mut *tx, answer.participant_id, answer.quiz_id).await?;
        if let Some(score) = tally.final_score() {
            entry.mark_completed(now, score);
        }

        save_entry(&mut *tx, &entry).await?;

        tx.commit().await?;

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
        let answers = sqlx::query_as::<_, ParticipantAnswer>(
            r#"
            SELECT * FROM participant_answers
            WHERE participant_id = $1 AND quiz_id = $2
            ORDER BY id
            "#,
        )
        .bind(participant_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn tally(&self, participant_id: i64, quiz_id: i64) -> QuizResult<Tally> {
        let mut conn = self.pool.acquire().await?;
        tally_on(&mut conn, participant_id, quiz_id).await
    }
}
