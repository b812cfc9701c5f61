//! Depth-bounded expansion of a seed question into a tree of follow-ups.
//!
//! Each visited node is resolved in four steps:
//!
//! 1. the question is researched ([`ResearchProvider`]);
//! 2. the answer is appended to the caller's [`History`];
//! 3. the answer is written to the transcript, in the root layout at depth 0
//!    and the descendant layout below it;
//! 4. follow-up candidates are generated from the answer ([`QuestionGenerator`]).
//!
//! Every candidate then costs one [`Throttle`] wait, after which it is visited
//! only if the current node is shallower than the configured maximum depth.
//! Nodes at the maximum depth are still researched and still generate
//! candidates; their candidates are waited on but never visited.
//!
//! Traversal is pre-order and left to right: a candidate's whole subtree is
//! finished before the wait for its next sibling begins. The first failure
//! aborts the exploration; entries already appended and records already
//! written are kept.

mod throttle;

pub use throttle::{
    from_config as throttle_from_config, FixedDelay, Throttle, TokenBucket,
    DEFAULT_REQUESTS_PER_MINUTE,
};

use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{ClientError, QuestionGenerator, ResearchProvider};
use crate::models::{History, ResearchAnswer};
use crate::transcript::{TranscriptEntry, TranscriptSink};

/// Errors that abort an exploration
#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    /// The research provider or question generator failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The transcript record could not be written
    #[error("Failed to write transcript: {0}")]
    Transcript(#[from] std::io::Error),
}

/// Pending work on the traversal stack
#[derive(Debug)]
enum Step {
    /// Research and record a node, then queue its candidates
    Visit { question: String, depth: usize },
    /// Wait on the throttle, then visit the candidate if the parent is shallow enough
    Candidate { question: String, parent_depth: usize },
}

/// Expands a question into a tree of researched follow-up questions.
#[derive(Debug, Clone)]
pub struct Explorer {
    origin_question: String,
    max_depth: usize,
    researcher: Arc<dyn ResearchProvider>,
    generator: Arc<dyn QuestionGenerator>,
    transcript: Arc<dyn TranscriptSink>,
    throttle: Arc<dyn Throttle>,
}

impl Explorer {
    /// Create an explorer paced at [`DEFAULT_REQUESTS_PER_MINUTE`].
    pub fn new(
        origin_question: impl Into<String>,
        max_depth: usize,
        researcher: Arc<dyn ResearchProvider>,
        generator: Arc<dyn QuestionGenerator>,
        transcript: Arc<dyn TranscriptSink>,
    ) -> Self {
        Self {
            origin_question: origin_question.into(),
            max_depth,
            researcher,
            generator,
            transcript,
            throttle: Arc::new(FixedDelay::default()),
        }
    }

    /// Replace the candidate throttle
    pub fn with_throttle(mut self, throttle: Arc<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn origin_question(&self) -> &str {
        &self.origin_question
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Explore the origin question from depth 0 into a fresh history.
    pub async fn run(&self) -> Result<History, ExploreError> {
        let mut history = History::new();
        self.explore(&self.origin_question, 0, &mut history).await?;
        Ok(history)
    }

    /// Explore `question` as a node at `current_depth`, appending every visited
    /// node to `history` in pre-order.
    ///
    /// On error, `history` keeps the entries appended before the failure.
    pub async fn explore(
        &self,
        question: &str,
        current_depth: usize,
        history: &mut History,
    ) -> Result<(), ExploreError> {
        let mut stack = vec![Step::Visit {
            question: question.to_string(),
            depth: current_depth,
        }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit { question, depth } => {
                    let candidates = self.visit(&question, depth, history).await?;
                    // Reversed so the first candidate is popped first.
                    stack.extend(candidates.into_iter().rev().map(|question| {
                        Step::Candidate {
                            question,
                            parent_depth: depth,
                        }
                    }));
                }
                Step::Candidate {
                    question,
                    parent_depth,
                } => {
                    self.throttle.wait(parent_depth).await;
                    if parent_depth < self.max_depth {
                        stack.push(Step::Visit {
                            question,
                            depth: parent_depth + 1,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Resolve one node and return its follow-up candidates.
    async fn visit(
        &self,
        question: &str,
        depth: usize,
        history: &mut History,
    ) -> Result<Vec<String>, ExploreError> {
        info!(
            depth,
            provider = self.researcher.name(),
            question = %question,
            "Researching question"
        );
        let node: ResearchAnswer = self.researcher.research(question).await?;
        history.append(node.clone());

        self.transcript
            .record(TranscriptEntry::for_node(&self.origin_question, &node, depth))?;

        debug!(
            depth,
            generator = self.generator.name(),
            "Generating related questions"
        );
        let candidates = self.generator.generate(&node.answer).await?;
        debug!(depth, count = candidates.len(), "Related questions generated");

        Ok(candidates)
    }
}
