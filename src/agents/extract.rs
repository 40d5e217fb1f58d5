//! Reply-text extraction from runtime events
//!
//! Probing order, first match wins:
//! 1. first element of `content.parts`: its `text`, else its textual `content`
//! 2. `content.text`
//! 3. the top-level fields in [`FALLBACK_FIELDS`], as plain text or as an
//!    object carrying `text`
//!
//! An event that matches none of these carries no fragment. That is the
//! normal case for tool-call and metadata events.

use tracing::debug;

use crate::agents::domain::{EventShape, FieldValue, Probe};

/// Top-level fields probed when the event has no usable `content`
pub const FALLBACK_FIELDS: [&str; 6] = [
    "delta",
    "message",
    "output_text",
    "text",
    "response",
    "result",
];

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

fn settle<T>(probe: Probe<T>, location: &str) -> Option<T> {
    if let Probe::Unexpected(kind) = probe {
        debug!(location, kind, "Skipping event field of unexpected type");
    }
    probe.found()
}

fn from_first_part<E: EventShape + ?Sized>(event: &E) -> Option<&str> {
    let part = settle(event.first_part(), "content.parts")?;
    non_empty(part.text).or_else(|| non_empty(part.content))
}

fn from_content_text<E: EventShape + ?Sized>(event: &E) -> Option<&str> {
    non_empty(settle(event.content_text(), "content.text"))
}

fn from_named_field<'a, E: EventShape + ?Sized>(event: &'a E, name: &str) -> Option<&'a str> {
    match settle(event.field(name), name)? {
        FieldValue::Text(text) if !text.trim().is_empty() => Some(text),
        FieldValue::Text(_) => None,
        FieldValue::Structured(text) => non_empty(text),
    }
}

/// Extract the text fragment carried by one event, if any
///
/// Plain-text fallback fields are returned untrimmed; whitespace-only values
/// are skipped.
pub fn extract<E: EventShape + ?Sized>(event: &E) -> Option<&str> {
    from_first_part(event)
        .or_else(|| from_content_text(event))
        .or_else(|| {
            FALLBACK_FIELDS
                .iter()
                .find_map(|name| from_named_field(event, name))
        })
}
