//! Append-only record of every answer produced during one exploration.

use serde::{Deserialize, Serialize};

use super::ResearchAnswer;

/// Ordered, append-only sequence of answers in visitation order.
///
/// A `History` is created by the caller for each top-level exploration and
/// handed to the explorer by `&mut`. Entries can only be appended; nothing is
/// ever removed or reordered once recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<ResearchAnswer>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an answer to the end of the history
    pub fn append(&mut self, answer: ResearchAnswer) {
        self.entries.push(answer);
    }

    /// All entries in visitation order
    pub fn entries(&self) -> &[ResearchAnswer] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResearchAnswer> {
        self.entries.iter()
    }

    /// Questions in visitation order
    pub fn questions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.question.as_str()).collect()
    }

    /// Render the combined transcript: every entry, blank-line separated.
    pub fn render_combined(&self) -> String {
        self.entries
            .iter()
            .map(ResearchAnswer::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Consume the history, returning the underlying entries
    pub fn into_entries(self) -> Vec<ResearchAnswer> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a ResearchAnswer;
    type IntoIter = std::slice::Iter<'a, ResearchAnswer>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
