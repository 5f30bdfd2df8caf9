// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use quizhost::{
    config::Config,
    models::{
        invitation::{CreateInvitationRequest, QuizParticipant},
        quiz::{CreateChoiceRequest, CreateQuestionRequest, CreateQuizRequest, QuizStructure},
        user::{NewUser, Participant, User, UserIdentity, UserType},
    },
    repositories::{LedgerRepository, MemoryStore, QuizRepository, Store, UserRepository},
    routes,
    services::ledger,
    state::AppState,
    utils::{hash::hash_password, jwt::issue_token_pair},
};

pub const CREATOR_PASSWORD: &str = "creatorpass";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub config: Config,
    pub client: reqwest::Client,
}

/// A quiz with its creator and one invited, not yet activated participant.
pub struct Fixture {
    pub creator: User,
    pub quiz: QuizStructure,
    pub user: User,
    pub participant: Participant,
    pub invitation: QuizParticipant,
    pub token: String,
}

impl Fixture {
    pub fn question_id(&self, index: usize) -> i64 {
        self.quiz.questions[index].question.id
    }

    /// Id of the correct (`true`) or wrong (`false`) choice of a question.
    pub fn choice_id(&self, index: usize, correct: bool) -> i64 {
        self.quiz.questions[index]
            .choices
            .iter()
            .find(|c| c.is_correct == correct)
            .map(|c| c.id)
            .expect("fixture question has both kinds of choice")
    }

    pub fn creator_identity(&self) -> UserIdentity {
        identity_of(&self.creator)
    }

    pub fn participant_identity(&self) -> UserIdentity {
        identity_of(&self.user)
    }
}

pub fn identity_of(user: &User) -> UserIdentity {
    UserIdentity {
        user_id: user.id,
        role: user.role().expect("fixture users have a known role"),
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "memory://".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        jwt_refresh_expiration: 3600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        creator_username: None,
        creator_password: None,
        creator_email: None,
    }
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let config = test_config();

    let state = AppState {
        store: store.clone(),
        config: config.clone(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        config,
        client: reqwest::Client::new(),
    }
}

pub fn yes_no_question(text: &str) -> CreateQuestionRequest {
    CreateQuestionRequest {
        text: text.to_string(),
        choices: vec![
            CreateChoiceRequest {
                text: "Yes".to_string(),
                is_correct: true,
            },
            CreateChoiceRequest {
                text: "No".to_string(),
                is_correct: false,
            },
        ],
    }
}

pub async fn create_creator(store: &MemoryStore, username: &str) -> User {
    create_creator_in(store, username).await
}

pub async fn create_creator_in(store: &dyn Store, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: Some(hash_password(CREATOR_PASSWORD).unwrap()),
            user_type: UserType::Creator,
            is_active: true,
        })
        .await
        .unwrap()
}

pub async fn create_quiz(store: &MemoryStore, creator: &User, questions: usize) -> QuizStructure {
    create_quiz_in(store, creator, questions).await
}

pub async fn create_quiz_in(store: &dyn Store, creator: &User, questions: usize) -> QuizStructure {
    let draft = CreateQuizRequest {
        title: "Reality check quiz".to_string(),
        description: String::new(),
        questions: (1..=questions)
            .map(|i| yes_no_question(&format!("Question {}", i)))
            .collect(),
    };
    store.create_quiz(creator.id, &draft).await.unwrap()
}

/// Invites `email` to `quiz_id` on behalf of `creator`.
pub async fn invite(
    store: &MemoryStore,
    creator: &User,
    quiz_id: i64,
    email: &str,
) -> (Participant, QuizParticipant) {
    invite_in(store, creator, quiz_id, email).await
}

pub async fn invite_in(
    store: &dyn Store,
    creator: &User,
    quiz_id: i64,
    email: &str,
) -> (Participant, QuizParticipant) {
    ledger::invite_participant(
        store,
        &identity_of(creator),
        quiz_id,
        &CreateInvitationRequest {
            email: email.to_string(),
            username: None,
        },
    )
    .await
    .unwrap()
}

/// Creator, quiz with `questions` yes/no questions, and one dormant invited participant.
pub async fn seed(store: &MemoryStore, questions: usize) -> Fixture {
    seed_in(store, questions, "").await
}

/// Like `seed`, with `tag` appended to usernames and emails so fixtures can
/// share a long-lived database.
pub async fn seed_in(store: &dyn Store, questions: usize, tag: &str) -> Fixture {
    let creator = create_creator_in(store, &format!("creator{}", tag)).await;
    let quiz = create_quiz_in(store, &creator, questions).await;
    let (participant, invitation) = invite_in(
        store,
        &creator,
        quiz.quiz.id,
        &format!("participant{}@example.com", tag),
    )
    .await;

    let user = store
        .find_user_by_id(participant.user_id)
        .await
        .unwrap()
        .unwrap();
    let token = invitation.invitation_token.clone().unwrap();

    Fixture {
        creator,
        quiz,
        user,
        participant,
        invitation,
        token,
    }
}

/// Reloads the ledger entry for the fixture's participant.
pub async fn ledger_entry(store: &MemoryStore, fixture: &Fixture) -> QuizParticipant {
    ledger_entry_in(store, fixture).await
}

pub async fn ledger_entry_in(store: &dyn Store, fixture: &Fixture) -> QuizParticipant {
    store
        .find_invitation(fixture.participant.id, fixture.quiz.quiz.id)
        .await
        .unwrap()
        .unwrap()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Access token minted directly, bypassing login.
    pub fn access_token(&self, user: &User) -> String {
        issue_token_pair(user, &self.config).unwrap().access
    }

    pub async fn activate(&self, token: &str, password: &str) -> reqwest::Response {
        self.client
            .patch(self.url("/activate"))
            .json(&serde_json::json!({ "token": token, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Activates and returns the access token from the response.
    pub async fn activate_for_token(&self, token: &str) -> String {
        let body: serde_json::Value = self.activate(token, "newpass").await.json().await.unwrap();
        body["access"].as_str().unwrap().to_string()
    }

    pub async fn submit(
        &self,
        access: Option<&str>,
        quiz_id: i64,
        question_id: i64,
        body: serde_json::Value,
    ) -> reqwest::Response {
        let mut request = self.client.post(self.url(&format!(
            "/quizzes/{}/questions/{}/answers/",
            quiz_id, question_id
        )));
        if let Some(access) = access {
            request = request.bearer_auth(access);
        }
        request
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn progress(&self, access: &str, quiz_id: i64) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/quizzes/{}/progress", quiz_id)))
            .bearer_auth(access)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
