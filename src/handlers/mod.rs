// src/handlers/mod.rs

pub mod attempts;
pub mod auth;
pub mod classes;
pub mod profile;
pub mod questions;
pub mod quizzes;
