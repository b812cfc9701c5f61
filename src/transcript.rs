//! Incremental transcript of an exploration.
//!
//! Every visited node is written as one record as soon as it resolves, so the
//! file keeps everything answered before a failure. The root record shows the
//! task and its answer; every other node is written as additional research.
//!
//! Root record:
//!
//! ````text
//! Task
//! ```
//! <origin question>
//! ```
//! Original Answer
//! ```
//! <answer>
//!
//! ```
//! ````
//!
//! Descendant record:
//!
//! ````text
//! Additional Research
//! ```
//! Research Question: <question>
//! Research Answer: <answer>
//! ```
//!
//! ````

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::models::ResearchAnswer;

/// One record to be written to a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptEntry<'a> {
    /// The root node: the task that started the exploration and its answer
    Root { task: &'a str, answer: &'a str },
    /// Any node below the root
    Descendant { question: &'a str, answer: &'a str },
}

impl<'a> TranscriptEntry<'a> {
    /// Select the layout for a node at `depth`.
    pub fn for_node(origin_question: &'a str, node: &'a ResearchAnswer, depth: usize) -> Self {
        if depth == 0 {
            TranscriptEntry::Root {
                task: origin_question,
                answer: &node.answer,
            }
        } else {
            TranscriptEntry::Descendant {
                question: &node.question,
                answer: &node.answer,
            }
        }
    }

    /// Render the record exactly as it is written.
    pub fn render(&self) -> String {
        match self {
            TranscriptEntry::Root { task, answer } => format!(
                "Task\n```\n{}\n```\nOriginal Answer\n```\n{}\n\n```\n",
                task, answer
            ),
            TranscriptEntry::Descendant { question, answer } => format!(
                "Additional Research\n```\nResearch Question: {}\nResearch Answer: {}\n```\n\n",
                question, answer
            ),
        }
    }
}

/// Destination for transcript records.
pub trait TranscriptSink: Send + Sync + std::fmt::Debug {
    /// Durably record one entry before returning
    fn record(&self, entry: TranscriptEntry<'_>) -> io::Result<()>;
}

/// Appends records to a UTF-8 text file.
///
/// The file is opened, written and closed for every record.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    path: PathBuf,
}

impl TranscriptWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptSink for TranscriptWriter {
    fn record(&self, entry: TranscriptEntry<'_>) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.render().as_bytes())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_layout() {
        let entry = TranscriptEntry::Root {
            task: "Why is water wet?",
            answer: "Hydrogen bonds.",
        };
        assert_eq!(
            entry.render(),
            "Task\n```\nWhy is water wet?\n```\nOriginal Answer\n```\nHydrogen bonds.\n\n```\n"
        );
    }

    #[test]
    fn test_descendant_layout() {
        let entry = TranscriptEntry::Descendant {
            question: "What is a hydrogen bond?",
            answer: "An attraction.",
        };
        assert_eq!(
            entry.render(),
            "Additional Research\n```\nResearch Question: What is a hydrogen bond?\nResearch Answer: An attraction.\n```\n\n"
        );
    }

    #[test]
    fn test_for_node_selects_layout_by_depth() {
        let node = ResearchAnswer::new("Q1", "A1", vec!["https://c.example".into()]);

        assert_eq!(
            TranscriptEntry::for_node("Origin", &node, 0),
            TranscriptEntry::Root {
                task: "Origin",
                answer: "A1"
            }
        );
        assert_eq!(
            TranscriptEntry::for_node("Origin", &node, 2),
            TranscriptEntry::Descendant {
                question: "Q1",
                answer: "A1"
            }
        );
    }

    #[test]
    fn test_citations_are_not_written() {
        let node = ResearchAnswer::new("Q1", "A1", vec!["https://c.example".into()]);
        let rendered = TranscriptEntry::for_node("Origin", &node, 1).render();
        assert!(!rendered.contains("https://c.example"));
        assert!(!rendered.contains("Depth"));
    }

    #[test]
    fn test_writer_appends_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.txt");
        std::fs::write(&path, "existing\n").unwrap();

        let writer = TranscriptWriter::new(&path);
        writer
            .record(TranscriptEntry::Root {
                task: "T",
                answer: "A",
            })
            .unwrap();
        writer
            .record(TranscriptEntry::Descendant {
                question: "Q",
                answer: "B",
            })
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing\nTask\n"));
        assert!(contents.ends_with("Research Answer: B\n```\n\n"));
    }

    #[test]
    fn test_writer_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        assert!(!path.exists());

        TranscriptWriter::new(&path)
            .record(TranscriptEntry::Descendant {
                question: "Q",
                answer: "A",
            })
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_writer_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path().join("missing").join("t.txt"));
        assert!(writer
            .record(TranscriptEntry::Root {
                task: "T",
                answer: "A"
            })
            .is_err());
    }
}
