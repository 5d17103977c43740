//! crates/pet_advisor_core/src/events.rs
//!
//! Decoding of the advisory backend's answer stream.
//!
//! The body arrives as arbitrary byte chunks. Bytes are turned into text with an
//! incremental UTF-8 decoder, the text is split into records on blank lines, and
//! every record starting with `data: ` is parsed as a JSON [`StreamEvent`].

use serde::Deserialize;
use tracing::debug;

const RECORD_SEPARATOR: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";

//=========================================================================================
// Stream Events
//=========================================================================================

/// One decoded unit of an answer stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The backend is working; carries no content.
    Thinking,
    /// A fragment to append to the answer.
    ContentDelta(String),
    /// The complete, formatted answer, replacing whatever was shown.
    Formatted(String),
    /// The backend failed to answer.
    Error(String),
    /// The answer is complete.
    Done,
}

/// A parsed `data: ` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The event carried by the record, if any field was recognised.
    pub event: Option<StreamEvent>,
    /// Whether the record carries `status`, `content` or `error`, i.e. counts as
    /// the first sign of life from the backend.
    pub signals_activity: bool,
}

/// The wire shape of a record. The event kind is implied by which field is set.
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    error: Option<String>,
    status: Option<String>,
    formatted: Option<String>,
    done: Option<bool>,
    content: Option<String>,
}

/// Treats empty strings the same as absent fields.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

impl Record {
    /// Parses the JSON payload of a `data: ` record.
    ///
    /// When several fields are set, precedence is
    /// `error` > `status == "thinking"` > `formatted` > `done` > `content`.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let raw: RawRecord = serde_json::from_str(payload)?;

        let error = present(raw.error);
        let status = present(raw.status);
        let formatted = present(raw.formatted);
        let content = present(raw.content);

        let signals_activity = error.is_some() || status.is_some() || content.is_some();

        let event = if let Some(message) = error {
            Some(StreamEvent::Error(message))
        } else if status.as_deref() == Some("thinking") {
            Some(StreamEvent::Thinking)
        } else if let Some(text) = formatted {
            Some(StreamEvent::Formatted(text))
        } else if raw.done == Some(true) {
            Some(StreamEvent::Done)
        } else {
            content.map(StreamEvent::ContentDelta)
        };

        Ok(Self {
            event,
            signals_activity,
        })
    }
}

//=========================================================================================
// Incremental UTF-8 Decoding
//=========================================================================================

/// Decodes UTF-8 across chunk boundaries.
///
/// A multi-byte character cut by a chunk boundary is held back until the next
/// chunk completes it. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `pending + chunk` as forms complete characters.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let remainder = rest.to_vec();
        self.pending = remainder;
        out
    }

    /// Number of bytes held back for the next chunk.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

//=========================================================================================
// Record Framing
//=========================================================================================

/// Splits decoded text into `data: ` payloads.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    utf8: Utf8Decoder,
    buffer: String,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk of the body and returns the payloads of every record it
    /// completed, in stream order. Segments without the `data: ` prefix are skipped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);

        let mut payloads = Vec::new();
        while let Some(end) = self.buffer.find(RECORD_SEPARATOR) {
            let segment: String = self.buffer.drain(..end + RECORD_SEPARATOR.len()).collect();
            let segment = &segment[..end];
            match segment.strip_prefix(DATA_PREFIX) {
                Some(payload) => payloads.push(payload.to_string()),
                None => debug!(segment, "Skipping non-data record."),
            }
        }
        payloads
    }

    /// Ends the stream. Whatever was never terminated by a blank line is dropped.
    pub fn finish(self) {
        if !self.buffer.is_empty() || self.utf8.pending_len() > 0 {
            debug!(
                leftover_text = %self.buffer,
                leftover_bytes = self.utf8.pending_len(),
                "Discarding unterminated tail of the answer stream."
            );
        }
    }
}
