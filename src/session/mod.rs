// Session module
// Question answering over the index: retrieve, render, generate, remember


use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::conversation::{ConversationConfig, ConversationMemory, ConversationTurn, DisplayHistory};
use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::index::{EmbeddingIndex, IndexSettings};
use crate::prompt::{PromptBuilder, PromptConfig};
use crate::retriever::{RetrievalConfig, Retriever};
use crate::{RagError, Result};

/// Reply to the exit sentinel
pub const EXIT_MESSAGE: &str = "Exiting the chat. Goodbye!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `initialize` has not completed
    Uninitialized,
    /// Waiting for a question
    Ready,
    /// A question is in flight
    Answering,
    /// The question in flight failed; the session is `Ready` again once the error is returned
    Failed,
}

/// Everything a session needs from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub index: IndexSettings,
    pub retrieval: RetrievalConfig,
    pub conversation: ConversationConfig,
    pub prompt: PromptConfig,
}

impl SessionOptions {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: IndexSettings::from_config(config),
            retrieval: config.retrieval.clone(),
            conversation: config.conversation.clone(),
            prompt: config.prompt.clone(),
        }
    }
}

#[derive(Debug)]
struct Conversation {
    memory: ConversationMemory,
    history: DisplayHistory,
    phase: SessionState,
}

/// One user's question-answering session.
///
/// Only one question is answered at a time; a concurrent `ask` is rejected with
/// [`RagError::Busy`]. Memory and history only change after a successful answer.
pub struct Session {
    options: SessionOptions,
    prompt: PromptBuilder,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    retriever: OnceCell<Retriever>,
    conversation: Mutex<Conversation>,
}

impl std::fmt::Debug for Session {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[inline]
    pub fn new(
        options: SessionOptions,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let conversation = Conversation {
            memory: ConversationMemory::new(options.conversation.memory_window),
            history: DisplayHistory::new(options.conversation.display_capacity),
            phase: SessionState::Ready,
        };

        Self {
            prompt: PromptBuilder::new(&options.prompt),
            options,
            embedder,
            generator,
            retriever: OnceCell::new(),
            conversation: Mutex::new(conversation),
        }
    }

    /// Open or build the index. Calling it again is a no-op.
    #[inline]
    pub async fn initialize(&self) -> Result<()> {
        if self.retriever.initialized() {
            debug!("Session already initialized");
            return Ok(());
        }

        self.retriever
            .get_or_try_init(|| async {
                let index =
                    EmbeddingIndex::open_or_build(&self.options.index, Arc::clone(&self.embedder))
                        .await?;
                info!("Session ready with {} indexed chunks", index.len());
                Ok::<_, RagError>(Retriever::new(Arc::new(index), &self.options.retrieval))
            })
            .await?;

        Ok(())
    }

    /// Answer a question using retrieved context and recent conversation
    #[inline]
    pub async fn ask(&self, question: &str) -> Result<String> {
        if self.is_exit(question) {
            info!("Exit requested");
            return Ok(EXIT_MESSAGE.to_string());
        }

        let retriever = self.retriever.get().ok_or(RagError::NotInitialized)?;
        let mut conversation = self.conversation.try_lock().map_err(|_| RagError::Busy)?;

        conversation.phase = SessionState::Answering;

        let result = self
            .answer(retriever, &conversation.memory.as_context(), question)
            .await;
        match &result {
            Ok(answer) => {
                conversation.memory.record(question, answer);
                conversation.history.record(question, answer);
            }
            Err(error) => {
                conversation.phase = SessionState::Failed;
                warn!("Failed to answer question: {}", error);
            }
        }

        debug!("Question finished in state {:?}", conversation.phase);
        conversation.phase = SessionState::Ready;
        result
    }

    async fn answer(
        &self,
        retriever: &Retriever,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<String> {
        let context = retriever.retrieve(question).await?;
        let prompt = PromptBuilder::with_history(history, &self.prompt.render(&context, question));

        debug!(
            "Generating answer from {} chunks and {} earlier turns",
            context.len(),
            history.len()
        );

        self.generator.generate(&prompt).await.map_err(|error| match error {
            RagError::Generation(_) => error,
            other => RagError::Generation(other.to_string()),
        })
    }

    /// Whether the question is the configured exit sentinel
    #[inline]
    pub fn is_exit(&self, question: &str) -> bool {
        question.trim().to_lowercase() == self.options.conversation.exit_sentinel.trim().to_lowercase()
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        if !self.retriever.initialized() {
            return SessionState::Uninitialized;
        }

        self.conversation
            .try_lock()
            .map_or(SessionState::Answering, |conversation| conversation.phase)
    }

    /// Turns currently fed back to the model, oldest first
    #[inline]
    pub async fn memory(&self) -> Vec<ConversationTurn> {
        self.conversation.lock().await.memory.as_context()
    }

    /// Snapshot of the display history
    #[inline]
    pub async fn history(&self) -> DisplayHistory {
        self.conversation.lock().await.history.clone()
    }

    /// Indexed chunk count, once initialized
    #[inline]
    pub fn index_len(&self) -> Option<usize> {
        self.retriever.get().map(|retriever| retriever.index().len())
    }

    #[inline]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}
