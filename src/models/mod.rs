//! Core data models for researched questions and exploration history.

mod answer;
mod history;

pub use answer::ResearchAnswer;
pub use history::History;
