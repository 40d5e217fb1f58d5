//! Turn aggregation: fold a turn's event stream into one reply text

use futures::{Stream, StreamExt};

use crate::agents::domain::EventShape;
use crate::agents::extract::extract;

/// Accumulation buffer for a single in-flight turn
#[derive(Debug, Default)]
pub struct TurnAggregator {
    buffer: String,
    events: usize,
    fragments: usize,
}

impl TurnAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event; returns whether it contributed a fragment
    pub fn push<E: EventShape + ?Sized>(&mut self, event: &E) -> bool {
        self.events += 1;
        match extract(event) {
            Some(fragment) => {
                self.buffer.push_str(fragment);
                self.fragments += 1;
                true
            }
            None => false,
        }
    }

    /// Number of events seen so far
    pub fn events(&self) -> usize {
        self.events
    }

    /// Number of events that contributed text
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// The concatenated reply; empty when no event carried text
    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Consume a turn's event stream to completion and concatenate every
/// extracted fragment in arrival order, without separators.
///
/// The first stream error aborts aggregation and is returned as-is.
pub async fn aggregate<S, E, Err>(stream: S) -> Result<String, Err>
where
    S: Stream<Item = Result<E, Err>>,
    E: EventShape,
{
    futures::pin_mut!(stream);
    let mut aggregator = TurnAggregator::new();

    while let Some(item) = stream.next().await {
        aggregator.push(&item?);
    }

    tracing::debug!(
        events = aggregator.events(),
        fragments = aggregator.fragments(),
        "Turn stream completed"
    );
    Ok(aggregator.finish())
}
