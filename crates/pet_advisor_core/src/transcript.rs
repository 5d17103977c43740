//! crates/pet_advisor_core/src/transcript.rs
//!
//! The message history of one chat session and the bookkeeping of its single
//! in-flight exchange.

use crate::domain::{Message, Role};
use uuid::Uuid;

/// The assistant's opening line for a new session.
pub const GREETING: &str =
    "您好！我是AI宠物营养顾问，很高兴为您服务。您可以问我任何关于宠物饮食安全和营养的问题。";

/// Prefixed to an error reported by the backend.
pub const APOLOGY_PREFIX: &str = "抱歉，";

/// Shown when the backend could not be reached or the stream broke.
pub const UNAVAILABLE_APOLOGY: &str = "抱歉，AI 服务暂时不可用，请稍后再试。";

/// Shown when an exchange ended without any answer text.
pub const NO_ANSWER_APOLOGY: &str = "抱歉，暂时没有得到有效回答，请稍后再试。";

/// Suggested questions offered before the user has asked anything.
pub const QUICK_QUESTIONS: [&str; 4] = [
    "狗狗可以吃西瓜吗？",
    "猫咪呕吐是什么原因？",
    "如何选择优质猫粮？",
    "宠物营养搭配建议",
];

/// An ordered, append-only list of messages.
///
/// At most one exchange is in flight at a time. Only the placeholder of that
/// exchange may have its content rewritten.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    in_flight: Option<Uuid>,
    loading: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript opened by the assistant greeting.
    pub fn with_greeting() -> Self {
        let mut transcript = Self::new();
        transcript
            .messages
            .push(Message::new(Role::Assistant, GREETING));
        transcript
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Whether an exchange is being processed.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The id of the placeholder being filled by the in-flight exchange.
    pub fn in_flight_placeholder(&self) -> Option<Uuid> {
        self.in_flight
    }

    /// Whether the loading indicator should be shown.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Quick questions are offered until the user has said something.
    pub fn offers_quick_questions(&self) -> bool {
        self.messages.len() <= 1
    }

    /// Starts an exchange: appends the user's question and an empty assistant
    /// placeholder, and marks the transcript in flight.
    ///
    /// Returns the placeholder id, or `None` when the trimmed question is empty or
    /// another exchange is already in flight. In that case nothing is changed.
    pub(crate) fn begin_exchange(&mut self, question: &str) -> Option<Uuid> {
        let question = question.trim();
        if question.is_empty() || self.in_flight.is_some() {
            return None;
        }

        self.messages.push(Message::new(Role::User, question));
        let placeholder = Message::new(Role::Assistant, "");
        let id = placeholder.id();
        self.messages.push(placeholder);

        self.in_flight = Some(id);
        self.loading = true;
        Some(id)
    }

    /// Replaces the content of an assistant message. User messages are never touched.
    pub(crate) fn set_assistant_content(&mut self, id: Uuid, content: &str) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id() == id)
            .and_then(Message::content_mut)
        {
            Some(slot) => {
                slot.clear();
                slot.push_str(content);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Ends the in-flight exchange, making sure its placeholder is not left empty.
    pub(crate) fn end_exchange(&mut self, id: Uuid) {
        let empty = self
            .get(id)
            .map(|m| m.content().is_empty())
            .unwrap_or(false);
        if empty {
            self.set_assistant_content(id, NO_ANSWER_APOLOGY);
        }
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }
        self.loading = false;
    }
}
