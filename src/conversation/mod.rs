// Conversation module
// Bounded recent-turn memory fed back to the model, and a larger display history


use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MEMORY_WINDOW: usize = 3;
pub const DEFAULT_DISPLAY_CAPACITY: usize = 50;
pub const DEFAULT_EXIT_SENTINEL: &str = "exit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Turns fed back to the model as history
    pub memory_window: usize,
    /// Turns kept for rendering
    pub display_capacity: usize,
    /// Question that ends the chat, compared case-insensitively
    pub exit_sentinel: String,
}

impl Default for ConversationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            memory_window: DEFAULT_MEMORY_WINDOW,
            display_capacity: DEFAULT_DISPLAY_CAPACITY,
            exit_sentinel: DEFAULT_EXIT_SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    #[inline]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// FIFO buffer that drops its oldest turn once full
#[derive(Debug, Clone, PartialEq, Eq)]
struct BoundedTurns {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl BoundedTurns {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }
}

/// The recent-turn window supplied to the model as conversational context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMemory {
    inner: BoundedTurns,
}

impl ConversationMemory {
    #[inline]
    pub fn new(window: usize) -> Self {
        Self {
            inner: BoundedTurns::new(window),
        }
    }

    #[inline]
    pub fn record(&mut self, question: &str, answer: &str) {
        self.inner.push(ConversationTurn::new(question, answer));
    }

    /// Current window, oldest first
    #[inline]
    pub fn as_context(&self) -> Vec<ConversationTurn> {
        self.inner.turns.iter().cloned().collect()
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.inner.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.turns.is_empty()
    }
}

/// Turns retained for the UI, independent of what the model sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHistory {
    inner: BoundedTurns,
}

impl DisplayHistory {
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedTurns::new(capacity),
        }
    }

    #[inline]
    pub fn record(&mut self, question: &str, answer: &str) {
        self.inner.push(ConversationTurn::new(question, answer));
    }

    #[inline]
    pub fn latest(&self) -> Option<&ConversationTurn> {
        self.inner.turns.back()
    }

    /// Oldest first
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ConversationTurn> + ExactSizeIterator {
        self.inner.turns.iter()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.turns.is_empty()
    }
}
