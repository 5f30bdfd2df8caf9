// src/handlers/mod.rs

pub mod auth;
pub mod invitation;
pub mod quiz;
