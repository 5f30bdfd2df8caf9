// src/services/mod.rs

pub mod access;
pub mod activation;
pub mod auth;
pub mod ledger;
pub mod progress;
pub mod quizzes;
pub mod scoring;
pub mod submission;
