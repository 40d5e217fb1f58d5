//! Runtime events and the probe interface used to read text out of them
//!
//! Agent runtimes do not agree on where reply text lives inside an event.
//! [`EventShape`] exposes the handful of places text is known to appear,
//! each accessor reporting explicitly whether the probed field was found,
//! absent, or present with a type it cannot be read as.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Content;

/// Outcome of probing one location of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<T> {
    /// The field exists and has the expected type
    Found(T),
    /// The field is missing or null
    Absent,
    /// The field exists but holds a value of another kind
    Unexpected(&'static str),
}

impl<T> Probe<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Probe::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Text-bearing fields of the first element of `content.parts`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartView<'a> {
    pub text: Option<&'a str>,
    pub content: Option<&'a str>,
}

/// Value of a named top-level field of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// A plain string
    Text(&'a str),
    /// A structured value, with its own `text` member when it has a textual one
    Structured(Option<&'a str>),
}

/// Capability-probe view over a runtime event
pub trait EventShape {
    /// First element of `content.parts`; `Absent` when content or parts are
    /// missing or the parts list is empty
    fn first_part(&self) -> Probe<PartView<'_>>;

    /// `content.text`
    fn content_text(&self) -> Probe<&str>;

    /// A top-level field of the event
    fn field(&self, name: &str) -> Probe<FieldValue<'_>>;
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn probe_object<'a>(value: Option<&'a Value>) -> Probe<&'a Map<String, Value>> {
    match value {
        None | Some(Value::Null) => Probe::Absent,
        Some(Value::Object(map)) => Probe::Found(map),
        Some(other) => Probe::Unexpected(kind_of(other)),
    }
}

fn probe_str(value: Option<&Value>) -> Probe<&str> {
    match value {
        None | Some(Value::Null) => Probe::Absent,
        Some(Value::String(s)) => Probe::Found(s.as_str()),
        Some(other) => Probe::Unexpected(kind_of(other)),
    }
}

fn probe_field(value: Option<&Value>) -> Probe<FieldValue<'_>> {
    match value {
        None | Some(Value::Null) => Probe::Absent,
        Some(Value::String(s)) => Probe::Found(FieldValue::Text(s.as_str())),
        Some(Value::Object(map)) => {
            Probe::Found(FieldValue::Structured(map.get("text").and_then(Value::as_str)))
        }
        Some(other) => Probe::Unexpected(kind_of(other)),
    }
}

fn part_view(part: &Value) -> PartView<'_> {
    PartView {
        text: part.get("text").and_then(Value::as_str),
        content: part.get("content").and_then(Value::as_str),
    }
}

/// Raw JSON events, as produced by remote runtimes
impl EventShape for Value {
    fn first_part(&self) -> Probe<PartView<'_>> {
        let content = match probe_object(self.get("content")) {
            Probe::Found(content) => content,
            Probe::Absent => return Probe::Absent,
            Probe::Unexpected(kind) => return Probe::Unexpected(kind),
        };

        match content.get("parts") {
            None | Some(Value::Null) => Probe::Absent,
            Some(Value::Array(parts)) => match parts.first() {
                Some(first) => Probe::Found(part_view(first)),
                None => Probe::Absent,
            },
            Some(other) => Probe::Unexpected(kind_of(other)),
        }
    }

    fn content_text(&self) -> Probe<&str> {
        match probe_object(self.get("content")) {
            Probe::Found(content) => probe_str(content.get("text")),
            Probe::Absent => Probe::Absent,
            Probe::Unexpected(kind) => Probe::Unexpected(kind),
        }
    }

    fn field(&self, name: &str) -> Probe<FieldValue<'_>> {
        probe_field(self.get(name))
    }
}

/// Event emitted by the in-process runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub turn_complete: bool,
    /// Any further producer-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RuntimeEvent {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn turn_complete(mut self) -> Self {
        self.turn_complete = true;
        self
    }
}

impl EventShape for RuntimeEvent {
    fn first_part(&self) -> Probe<PartView<'_>> {
        match self.content.as_ref().and_then(|c| c.parts.first()) {
            Some(first) => Probe::Found(PartView {
                text: first.text.as_deref(),
                content: first.extra.get("content").and_then(Value::as_str),
            }),
            None => Probe::Absent,
        }
    }

    fn content_text(&self) -> Probe<&str> {
        match &self.content {
            Some(content) => probe_str(content.extra.get("text")),
            None => Probe::Absent,
        }
    }

    fn field(&self, name: &str) -> Probe<FieldValue<'_>> {
        probe_field(self.extra.get(name))
    }
}

/// Event in a runtime's response stream
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Typed event from the in-process runtime
    Runtime(RuntimeEvent),
    /// Untyped JSON event from a remote runtime
    Raw(Value),
}

impl From<RuntimeEvent> for AgentEvent {
    fn from(event: RuntimeEvent) -> Self {
        AgentEvent::Runtime(event)
    }
}

impl From<Value> for AgentEvent {
    fn from(value: Value) -> Self {
        AgentEvent::Raw(value)
    }
}

impl EventShape for AgentEvent {
    fn first_part(&self) -> Probe<PartView<'_>> {
        match self {
            AgentEvent::Runtime(event) => event.first_part(),
            AgentEvent::Raw(value) => value.first_part(),
        }
    }

    fn content_text(&self) -> Probe<&str> {
        match self {
            AgentEvent::Runtime(event) => event.content_text(),
            AgentEvent::Raw(value) => value.content_text(),
        }
    }

    fn field(&self, name: &str) -> Probe<FieldValue<'_>> {
        match self {
            AgentEvent::Runtime(event) => event.field(name),
            AgentEvent::Raw(value) => value.field(name),
        }
    }
}
