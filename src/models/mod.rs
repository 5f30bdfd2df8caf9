// src/models/mod.rs

pub mod answer;
pub mod invitation;
pub mod progress;
pub mod quiz;
pub mod user;
