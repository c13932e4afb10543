//! Diagnostic accumulation.
//!
//! Every recoverable problem found during an update cycle (unreadable file,
//! bad manifest, unknown docblock directive) becomes a [`Message`] on a
//! [`MessageList`]. Lists are owned values: loaders return one per call and
//! the update task merges them into a single aggregate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note.
    Message,
    Warning,
    Error,
    /// Fatal-class error ("clowntown"): the file is broken badly enough that
    /// its resource should not be trusted.
    Clowntown,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Message => "message",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Clowntown => "clowntown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Path of the file the diagnostic is about.
    pub file: String,
    /// Short machine-readable category, e.g. `docblock` or `parse`.
    pub code: String,
    pub severity: Severity,
    pub text: String,
}

impl Message {
    pub fn new(
        file: impl Into<String>,
        code: impl Into<String>,
        severity: Severity,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code: code.into(),
            severity,
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: {}", self.severity, self.code, self.file, self.text)
    }
}

/// Ordered list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageList {
    messages: Vec<Message>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_message(&mut self, file: &str, code: &str, text: impl Into<String>) {
        self.add(Message::new(file, code, Severity::Message, text));
    }

    pub fn add_warning(&mut self, file: &str, code: &str, text: impl Into<String>) {
        self.add(Message::new(file, code, Severity::Warning, text));
    }

    pub fn add_error(&mut self, file: &str, code: &str, text: impl Into<String>) {
        self.add(Message::new(file, code, Severity::Error, text));
    }

    pub fn add_clowntown(&mut self, file: &str, code: &str, text: impl Into<String>) {
        self.add(Message::new(file, code, Severity::Clowntown, text));
    }

    /// Append every entry of `other`, consuming it.
    pub fn merge(&mut self, other: MessageList) {
        self.messages.extend(other.messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Number of entries at `severity` or worse.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity >= severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count_at_least(Severity::Error) > 0
    }

    pub fn into_vec(self) -> Vec<Message> {
        self.messages
    }
}

impl From<Vec<Message>> for MessageList {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl Extend<Message> for MessageList {
    fn extend<T: IntoIterator<Item = Message>>(&mut self, iter: T) {
        self.messages.extend(iter);
    }
}

impl IntoIterator for MessageList {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageList {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
