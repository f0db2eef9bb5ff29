//! Chat turn orchestration.
//!
//! One submitted question moves through
//! `Composing -> PreconditionCheck -> {Blocked | Dispatching} -> {Answered | Failed}`.
//! The user message is appended optimistically and never retracted; every
//! gateway failure is reconciled into a flagged assistant message so the
//! log always shows a resolution for each turn.

use std::sync::Arc;

use tokio::sync::RwLock;

use studium_core::error::Result;
use studium_core::session::{Message, SessionContext, SessionStore};
use studium_core::validate;
use studium_gateway::{QuestionContext, RequestGateway};

/// Answer length used by standard-mode questions until the user picks one.
const DEFAULT_MARKS: u32 = 3;

/// How questions are contextualized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyMode {
    /// Plain document chat; free-text syllabus context travels along when
    /// present.
    #[default]
    Standard,
    /// Contextual study: subject, unit, topic and marks must all be selected
    /// before a question may be dispatched.
    Contextual,
}

/// A precondition the session does not yet satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Subject,
    Unit,
    Topic,
    Marks,
}

impl Precondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Unit => "unit",
            Self::Topic => "topic",
            Self::Marks => "marks",
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution of one submitted question.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The backend answered; the appended assistant message is returned
    /// (its `error` flag set for backend-signaled soft errors).
    Answered(Message),
    /// Contextual preconditions are unmet; nothing was appended and the
    /// backend was not contacted.
    Blocked(Vec<Precondition>),
    /// Dispatch failed; the flagged assistant message that resolved the
    /// turn is returned.
    Failed(Message),
}

/// Drives question-answer turns against the gateway.
pub struct ChatOrchestrator {
    gateway: Arc<RequestGateway>,
    store: Arc<SessionStore>,
    mode: RwLock<StudyMode>,
}

impl ChatOrchestrator {
    pub fn new(gateway: Arc<RequestGateway>, store: Arc<SessionStore>) -> Self {
        Self {
            gateway,
            store,
            mode: RwLock::new(StudyMode::default()),
        }
    }

    /// The active study mode.
    pub async fn mode(&self) -> StudyMode {
        *self.mode.read().await
    }

    /// Switches study mode. Leaving contextual mode clears the syllabus
    /// selection, matching the study panel's toggle.
    pub async fn set_mode(&self, mode: StudyMode) {
        let mut current = self.mode.write().await;
        let leaving_contextual =
            *current == StudyMode::Contextual && mode == StudyMode::Standard;
        *current = mode;
        drop(current);
        if leaving_contextual {
            self.store.clear_syllabus().await;
        }
    }

    /// Submits one question.
    ///
    /// Returns `Err` only for locally invalid input (empty or oversized
    /// question), before anything is appended to the log. Gateway and
    /// backend failures resolve to [`TurnOutcome::Failed`]; they are part of
    /// the conversation, not propagated errors.
    pub async fn ask(&self, question: &str) -> Result<TurnOutcome> {
        validate::validate_question(question, self.gateway.limits())?;
        let question = question.trim();

        let mode = self.mode().await;
        let snapshot = self.store.snapshot().await;

        if mode == StudyMode::Contextual {
            let missing = missing_preconditions(&snapshot);
            if !missing.is_empty() {
                tracing::debug!(?missing, "question blocked on study context");
                return Ok(TurnOutcome::Blocked(missing));
            }
        }

        let context = match mode {
            StudyMode::Standard => QuestionContext::Standard {
                syllabus_context: Some(snapshot.syllabus_text.clone()),
            },
            StudyMode::Contextual => QuestionContext::Contextual {
                subject: snapshot.subject.clone(),
                unit: snapshot.unit.clone(),
                topic: snapshot.topic.clone(),
            },
        };
        let marks = snapshot.marks.unwrap_or(DEFAULT_MARKS);

        // optimistic append; this message stays even if the turn fails
        self.store.append_message(Message::user(question)).await;
        let log = self.store.snapshot().await.messages;

        match self
            .gateway
            .submit_question(question, context, marks, &log)
            .await
        {
            Ok(reply) => {
                let message = Message::assistant(reply.answer, reply.sources, reply.error);
                self.store.append_message(message.clone()).await;
                Ok(TurnOutcome::Answered(message))
            }
            Err(err) => {
                tracing::warn!(error = %err, "question dispatch failed");
                let message = Message::failure(err.user_message());
                self.store.append_message(message.clone()).await;
                Ok(TurnOutcome::Failed(message))
            }
        }
    }
}

/// The contextual-study checklist: subject, unit, topic and marks.
fn missing_preconditions(context: &SessionContext) -> Vec<Precondition> {
    let mut missing = Vec::new();
    if context.subject.trim().is_empty() {
        missing.push(Precondition::Subject);
    }
    if context.unit.trim().is_empty() {
        missing.push(Precondition::Unit);
    }
    if context.topic.trim().is_empty() {
        missing.push(Precondition::Topic);
    }
    if context.marks.is_none() {
        missing.push(Precondition::Marks);
    }
    missing
}
