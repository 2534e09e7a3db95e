//! Conversation history and prompt construction.
//!
//! A [`Conversation`] keeps the full, append-only history of one session.
//! Prompts only ever see a trailing window of it; reading the window never
//! shortens the stored history.

pub mod sessions;

pub use sessions::SessionStore;

use crate::types::{ChatMessage, ConversationTurn, MessageRole};
use chrono::Utc;

/// Default number of recent turns to include in a prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

const CONTEXT_PREAMBLE: &str =
    "Use the following information from the indexed documents to answer the user's question:";

const CONTEXT_POSTSCRIPT: &str = "Please provide a helpful response based on this information. \
If the information doesn't answer the question completely, say so.";

/// Wrap retrieved context in the instruction sent as a second system message.
pub fn context_message(context: &str) -> String {
    format!("{}\n\n{}\n\n{}", CONTEXT_PREAMBLE, context, CONTEXT_POSTSCRIPT)
}

/// Returns the trailing `window_size` turns.
pub fn truncate_history(history: &[ConversationTurn], window_size: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(window_size)..]
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn stamped with the current time.
    pub fn record(&mut self, role: MessageRole, content: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// Full, unwindowed history.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The trailing `window_size` turns.
    pub fn window(&self, window_size: usize) -> &[ConversationTurn] {
        truncate_history(&self.turns, window_size)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Messages for the completion service: system prompt, optional context,
    /// then the last `window_size` user/assistant turns.
    pub fn build_prompt(&self, system_prompt: &str, context: &str, window_size: usize) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(system_prompt)];

        if !context.is_empty() {
            messages.push(ChatMessage::system(context_message(context)));
        }

        messages.extend(
            self.window(window_size)
                .iter()
                .filter(|turn| matches!(turn.role, MessageRole::User | MessageRole::Assistant))
                .map(|turn| ChatMessage {
                    role: turn.role,
                    content: turn.content.clone(),
                }),
        );

        messages
    }

    /// The prompt [`build_prompt`](Self::build_prompt) would produce after
    /// recording `pending` as a user turn, without recording it.
    pub fn build_prompt_with_pending(
        &self,
        system_prompt: &str,
        context: &str,
        window_size: usize,
        pending: &str,
    ) -> Vec<ChatMessage> {
        let mut preview = Conversation {
            turns: self.window(window_size).to_vec(),
        };
        preview.record(MessageRole::User, pending);
        preview.build_prompt(system_prompt, context, window_size)
    }
}
