//! Request handlers

pub mod answer;
pub mod health;
