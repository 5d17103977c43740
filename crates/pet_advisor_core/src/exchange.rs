//! crates/pet_advisor_core/src/exchange.rs
//!
//! Reconciliation of stream events into the placeholder message of one exchange.

use crate::events::StreamEvent;
use crate::transcript::{Transcript, APOLOGY_PREFIX, UNAVAILABLE_APOLOGY};
use uuid::Uuid;

/// What the consumer of the stream should do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished,
}

/// One question/answer exchange against a transcript.
///
/// Events must be applied in the order they were read from the stream; content
/// deltas build on whatever the previous events left in the buffer.
#[derive(Debug)]
pub struct Exchange {
    placeholder: Uuid,
    buffer: String,
}

impl Exchange {
    /// Opens an exchange for `question`, or returns `None` if the transcript refuses
    /// it (blank question, or another exchange still in flight).
    pub fn begin(transcript: &mut Transcript, question: &str) -> Option<Self> {
        transcript.begin_exchange(question).map(|placeholder| Self {
            placeholder,
            buffer: String::new(),
        })
    }

    pub fn placeholder(&self) -> Uuid {
        self.placeholder
    }

    /// Applies one event to the placeholder.
    pub fn apply(&mut self, event: StreamEvent, transcript: &mut Transcript) -> Flow {
        match event {
            StreamEvent::Error(message) => {
                let apology = format!("{APOLOGY_PREFIX}{message}");
                transcript.set_assistant_content(self.placeholder, &apology);
                Flow::Finished
            }
            StreamEvent::Thinking => Flow::Continue,
            StreamEvent::Formatted(text) => {
                transcript.set_assistant_content(self.placeholder, &text);
                self.buffer = text;
                transcript.set_loading(false);
                Flow::Continue
            }
            StreamEvent::ContentDelta(delta) => {
                self.buffer.push_str(&delta);
                transcript.set_assistant_content(self.placeholder, &self.buffer);
                Flow::Continue
            }
            StreamEvent::Done => Flow::Finished,
        }
    }

    /// Ends the exchange after a terminal event or the end of the stream.
    pub fn finish(self, transcript: &mut Transcript) {
        transcript.end_exchange(self.placeholder);
    }

    /// Ends the exchange after a transport failure, replacing any partial answer.
    pub fn fail(self, transcript: &mut Transcript) {
        transcript.set_assistant_content(self.placeholder, UNAVAILABLE_APOLOGY);
        transcript.end_exchange(self.placeholder);
    }
}
