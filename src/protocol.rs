//! Wire types exchanged with the analysis worker.
//!
//! Messages travel client -> worker as NDJSON lines; responses travel back
//! the same way. `Message` is a closed sum type tagged by a `"type"` field
//! so the worker dispatches on the variant, never on field sniffing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlation identifier linking a sent message to its eventual response.
///
/// Ids are drawn from `[1, id_max]`; 0 is reserved as the "no live request"
/// sentinel and is never put on the wire by the client.
pub type RequestId = u32;

/// Sentinel meaning "no request is live for this command".
pub const NO_REQUEST: RequestId = 0;

/// `(start, end)` line range of a request; an end of `-1` means "to end of
/// file".
pub type TextRange = (i64, i64);

/// The closed set of operations the worker supports.
///
/// The set comes from the worker's capability surface; this layer never
/// invents commands, it only validates caller strings against the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Autocomplete,
    Replacements,
    Highlight,
}

impl Command {
    /// Every supported command, for iteration and error reporting.
    pub const ALL: [Command; 3] = [
        Command::Autocomplete,
        Command::Replacements,
        Command::Highlight,
    ];

    /// Parse a caller-supplied command name.
    pub fn parse(s: &str) -> Option<Command> {
        match s {
            "autocomplete" => Some(Command::Autocomplete),
            "replacements" => Some(Command::Replacements),
            "highlight" => Some(Command::Highlight),
            _ => None,
        }
    }

    /// The wire name of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Autocomplete => "autocomplete",
            Command::Replacements => "replacements",
            Command::Highlight => "highlight",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client -> worker message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Liveness nudge; carries no payload and requires no answer.
    Ping { id: RequestId },

    /// An analysis request against one mirrored file.
    Request {
        id: RequestId,
        command: Command,
        file: String,
        expected_keywords: Vec<String>,
        current_word: String,
        language: String,
        text_range: TextRange,
    },

    /// A file-mutation event: upsert when `remove` is false, removal
    /// otherwise. Removals carry empty contents.
    Notification {
        id: RequestId,
        file: String,
        contents: String,
        remove: bool,
    },
}

impl Message {
    /// Build a ping.
    pub fn ping(id: RequestId) -> Self {
        Message::Ping { id }
    }

    /// Build an analysis request.
    pub fn request(
        id: RequestId,
        command: Command,
        file: impl Into<String>,
        ctx: RequestContext,
    ) -> Self {
        Message::Request {
            id,
            command,
            file: file.into(),
            expected_keywords: ctx.expected_keywords,
            current_word: ctx.current_word,
            language: ctx.language,
            text_range: ctx.text_range,
        }
    }

    /// Build an upsert notification carrying a file's full contents.
    pub fn upsert(id: RequestId, file: impl Into<String>, contents: impl Into<String>) -> Self {
        Message::Notification {
            id,
            file: file.into(),
            contents: contents.into(),
            remove: false,
        }
    }

    /// Build a removal notification.
    pub fn removal(id: RequestId, file: impl Into<String>) -> Self {
        Message::Notification {
            id,
            file: file.into(),
            contents: String::new(),
            remove: true,
        }
    }

    /// The correlation id stamped on this message.
    pub fn id(&self) -> RequestId {
        match self {
            Message::Ping { id }
            | Message::Request { id, .. }
            | Message::Notification { id, .. } => *id,
        }
    }
}

/// Caller-supplied request details beyond command and file.
///
/// `Default` carries the conventional values: no expected keywords, empty
/// current word, plain-text language, whole-file range.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Keywords the caller expects to see in the answer.
    pub expected_keywords: Vec<String>,
    /// The word fragment under the cursor.
    pub current_word: String,
    /// Source language tag.
    pub language: String,
    /// Line range the request applies to.
    pub text_range: TextRange,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            expected_keywords: Vec::new(),
            current_word: String::new(),
            language: "Text".to_string(),
            text_range: (1, -1),
        }
    }
}

/// A worker -> client response line.
///
/// A response without a `command` tag is a non-substantive acknowledgment
/// (e.g. the answer to a ping); it frees its id and nothing else. Unknown
/// fields are ignored so worker-side additions don't break older clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Id of the message this answers.
    pub id: RequestId,

    /// The command this response answers, absent for acknowledgments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,

    /// Command-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}
