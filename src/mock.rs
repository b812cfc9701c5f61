//! In-memory doubles for every exploration seam, for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use crate::clients::{ClientError, QuestionGenerator, ResearchProvider};
use crate::explorer::Throttle;
use crate::models::ResearchAnswer;
use crate::transcript::{TranscriptEntry, TranscriptSink};

/// Answers every question with `A(<question>)` and no citations.
#[derive(Debug, Default)]
pub struct MockResearcher {
    calls: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl MockResearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th call (1-based) with a transport error.
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Questions researched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResearchProvider for MockResearcher {
    fn name(&self) -> &str {
        "Mock Researcher"
    }

    async fn research(&self, question: &str) -> Result<ResearchAnswer, ClientError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(question.to_string());

        if Some(calls.len()) == self.fail_on_call {
            return Err(ClientError::Transport(format!(
                "mock failure on call {}",
                calls.len()
            )));
        }

        Ok(ResearchAnswer::new(
            question,
            format!("A({})", question),
            Vec::new(),
        ))
    }
}

/// How a [`MockGenerator`] picks its reply
#[derive(Debug)]
enum Replies {
    /// The same questions for every answer
    Constant(Vec<String>),
    /// Questions keyed by answer text; unknown answers get none
    Tree(HashMap<String, Vec<String>>),
    /// Every call fails
    Failing,
}

/// Returns predefined follow-up questions.
#[derive(Debug)]
pub struct MockGenerator {
    replies: Replies,
    calls: Mutex<Vec<String>>,
}

impl MockGenerator {
    fn with_replies(replies: Replies) -> Self {
        Self {
            replies,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return the same questions for every answer.
    pub fn constant<I, S>(questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(Replies::Constant(
            questions.into_iter().map(Into::into).collect(),
        ))
    }

    /// Return questions looked up by answer text.
    pub fn from_tree(tree: &[(&str, Vec<&str>)]) -> Self {
        let tree = tree
            .iter()
            .map(|(answer, questions)| {
                (
                    answer.to_string(),
                    questions.iter().map(|q| q.to_string()).collect(),
                )
            })
            .collect();
        Self::with_replies(Replies::Tree(tree))
    }

    /// Fail every call with a transport error.
    pub fn failing() -> Self {
        Self::with_replies(Replies::Failing)
    }

    /// Answers received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    fn name(&self) -> &str {
        "Mock Generator"
    }

    async fn generate(&self, source_answer: &str) -> Result<Vec<String>, ClientError> {
        self.calls.lock().unwrap().push(source_answer.to_string());

        match &self.replies {
            Replies::Constant(questions) => Ok(questions.clone()),
            Replies::Tree(tree) => Ok(tree.get(source_answer).cloned().unwrap_or_default()),
            Replies::Failing => Err(ClientError::Transport("mock generator failure".into())),
        }
    }
}

/// Records the depth of every wait without sleeping.
#[derive(Debug, Default)]
pub struct RecordingThrottle {
    depths: Mutex<Vec<usize>>,
}

impl RecordingThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depths of every wait, in order
    pub fn depths(&self) -> Vec<usize> {
        self.depths.lock().unwrap().clone()
    }

    /// Number of waits made for nodes at `depth`
    pub fn count_at(&self, depth: usize) -> usize {
        self.depths
            .lock()
            .unwrap()
            .iter()
            .filter(|d| **d == depth)
            .count()
    }

    pub fn total(&self) -> usize {
        self.depths.lock().unwrap().len()
    }
}

#[async_trait]
impl Throttle for RecordingThrottle {
    async fn wait(&self, depth: usize) {
        self.depths.lock().unwrap().push(depth);
    }
}

/// Keeps rendered transcript records in memory.
#[derive(Debug, Default)]
pub struct MemoryTranscript {
    records: Mutex<Vec<String>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records.lock().unwrap().clone()
    }
}

impl TranscriptSink for MemoryTranscript {
    fn record(&self, entry: TranscriptEntry<'_>) -> io::Result<()> {
        self.records.lock().unwrap().push(entry.render());
        Ok(())
    }
}
