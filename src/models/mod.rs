// src/models/mod.rs

pub mod attempt;
pub mod class;
pub mod question;
pub mod quiz;
pub mod user;
