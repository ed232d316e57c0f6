//! Core domain types: questions and the agent error taxonomy.

pub mod error;
pub mod question;
