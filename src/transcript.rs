//! Conversation transcript
//!
//! The transcript is the unit of conversational memory: an ordered,
//! append-only sequence of turn items that every collaborator call
//! receives in full. Items are never mutated or removed once pushed.

use serde::{Deserialize, Serialize};

/// Who a turn item is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    System,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single piece of message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text supplied to a model (user input, system hints)
    InputText { text: String },
    /// Text produced by a model
    OutputText { text: String },
}

impl ContentPart {
    pub fn input(text: impl Into<String>) -> Self {
        ContentPart::InputText { text: text.into() }
    }

    pub fn output(text: impl Into<String>) -> Self {
        ContentPart::OutputText { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            ContentPart::InputText { text } | ContentPart::OutputText { text } => text,
        }
    }
}

/// One entry of the transcript.
///
/// `id` is opaque and assigned by whichever collaborator produced the
/// item. Items created by the orchestrator itself carry no id so that
/// replaying a turn produces an identical prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnItem {
    UserText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        content: Vec<ContentPart>,
    },
    SystemHint {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        content: Vec<ContentPart>,
    },
    AssistantText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        content: Vec<ContentPart>,
    },
    ToolCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        call_id: String,
        name: String,
        /// JSON-encoded arguments, as emitted by the model
        arguments: String,
    },
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        call_id: String,
        output: String,
    },
}

impl TurnItem {
    pub fn user(text: impl Into<String>) -> Self {
        TurnItem::UserText {
            id: None,
            content: vec![ContentPart::input(text)],
        }
    }

    pub fn system_hint(text: impl Into<String>) -> Self {
        TurnItem::SystemHint {
            id: None,
            content: vec![ContentPart::input(text)],
        }
    }

    pub fn assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        TurnItem::AssistantText {
            id: Some(id.into()),
            content: vec![ContentPart::output(text)],
        }
    }

    pub fn tool_call(
        id: impl Into<String>,
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        TurnItem::ToolCall {
            id: Some(id.into()),
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn tool_result(
        id: impl Into<String>,
        call_id: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        TurnItem::ToolResult {
            id: Some(id.into()),
            call_id: call_id.into(),
            output: output.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            TurnItem::UserText { .. } => Role::User,
            TurnItem::SystemHint { .. } => Role::System,
            TurnItem::AssistantText { .. } | TurnItem::ToolCall { .. } => Role::Assistant,
            TurnItem::ToolResult { .. } => Role::Tool,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            TurnItem::UserText { id, .. }
            | TurnItem::SystemHint { id, .. }
            | TurnItem::AssistantText { id, .. }
            | TurnItem::ToolCall { id, .. }
            | TurnItem::ToolResult { id, .. } => id.as_deref(),
        }
    }

    /// Content parts of the item. Tool items render as a single part.
    pub fn parts(&self) -> Vec<ContentPart> {
        match self {
            TurnItem::UserText { content, .. }
            | TurnItem::SystemHint { content, .. }
            | TurnItem::AssistantText { content, .. } => content.clone(),
            TurnItem::ToolCall {
                name, arguments, ..
            } => vec![ContentPart::output(format!("{name}({arguments})"))],
            TurnItem::ToolResult { output, .. } => vec![ContentPart::input(output.clone())],
        }
    }

    /// Concatenated text of all content parts
    pub fn text(&self) -> String {
        self.parts()
            .iter()
            .map(ContentPart::text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Ordered, append-only sequence of turn items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    items: Vec<TurnItem>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: TurnItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = TurnItem>) {
        self.items.extend(items);
    }

    pub fn items(&self) -> &[TurnItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TurnItem> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&TurnItem> {
        self.items.last()
    }

    /// True if `prefix` is an exact, in-order prefix of this transcript
    pub fn starts_with(&self, prefix: &Transcript) -> bool {
        self.items.starts_with(&prefix.items)
    }

    /// Items appended after the first `len` entries
    pub fn tail_after(&self, len: usize) -> &[TurnItem] {
        self.items.get(len..).unwrap_or(&[])
    }

    pub fn into_items(self) -> Vec<TurnItem> {
        self.items
    }
}

impl From<Vec<TurnItem>> for Transcript {
    fn from(items: Vec<TurnItem>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TurnItem;
    type IntoIter = std::slice::Iter<'a, TurnItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
