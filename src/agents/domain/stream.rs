//! Channel-backed event stream returned by agent runtimes

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use super::AgentEvent;
use crate::agents::error::{AgentError, AgentResult};

type EventItem = AgentResult<AgentEvent>;

/// Stream of events produced for one turn
pub struct EventStream {
    receiver: mpsc::Receiver<EventItem>,
}

impl EventStream {
    /// Create a new event stream from a channel receiver
    pub fn new(receiver: mpsc::Receiver<EventItem>) -> Self {
        Self { receiver }
    }

    /// Create a channel pair for building an event stream
    pub fn channel(buffer: usize) -> (EventStreamSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (EventStreamSender { sender: tx }, Self { receiver: rx })
    }

    /// Create an already-terminated stream yielding the given items in order
    pub fn from_results(items: Vec<EventItem>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item, so this cannot fail
            let _ = tx.try_send(item);
        }
        Self { receiver: rx }
    }

    /// Create an already-terminated stream yielding the given events in order
    pub fn from_events<I, E>(events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<AgentEvent>,
    {
        Self::from_results(events.into_iter().map(|e| Ok(e.into())).collect())
    }
}

impl Stream for EventStream {
    type Item = EventItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Sender half for building an event stream
#[derive(Clone)]
pub struct EventStreamSender {
    sender: mpsc::Sender<EventItem>,
}

impl EventStreamSender {
    /// Send an event
    pub async fn send(
        &self,
        event: impl Into<AgentEvent>,
    ) -> Result<(), mpsc::error::SendError<EventItem>> {
        self.sender.send(Ok(event.into())).await
    }

    /// Send an error
    pub async fn send_error(&self, error: AgentError) -> Result<(), mpsc::error::SendError<EventItem>> {
        self.sender.send(Err(error)).await
    }

    /// Check if the receiver is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
