//! Relay from a completion stream to the response body
//!
//! A spawned task drains the provider stream into a bounded channel.
//! The channel sender is owned by a small state machine:
//!
//! ```text
//! Open --fragment--> Open
//! Open --end-------> Closed
//! Open --error-----> Erred --> Closed
//! ```
//!
//! The sender is dropped exactly once, on the transition into `Closed`,
//! which is what ends the consumer's stream.

use futures::stream::{BoxStream, Stream, StreamExt};
use profrag_core::Result;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Relay channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Open,
    Erred,
    Closed,
}

/// How a relay finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Provider stream ended normally
    Completed,
    /// Provider stream failed; the error was delivered to the consumer
    Failed,
    /// Consumer went away before the provider finished
    Abandoned,
}

/// Summary returned when a relay task finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    pub outcome: RelayOutcome,
    pub forwarded: usize,
}

struct Relay {
    tx: Option<mpsc::Sender<Result<String>>>,
    state: RelayState,
    outcome: RelayOutcome,
    forwarded: usize,
}

impl Relay {
    fn new(tx: mpsc::Sender<Result<String>>) -> Self {
        Self {
            tx: Some(tx),
            state: RelayState::Open,
            outcome: RelayOutcome::Completed,
            forwarded: 0,
        }
    }

    fn is_open(&self) -> bool {
        self.state == RelayState::Open
    }

    async fn forward(&mut self, fragment: String) {
        if !self.is_open() || fragment.is_empty() {
            return;
        }
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(Ok(fragment)).await.is_err() {
            self.outcome = RelayOutcome::Abandoned;
            self.close();
            return;
        }
        self.forwarded += 1;
    }

    async fn fail(&mut self, err: profrag_core::ProfError) {
        if !self.is_open() {
            return;
        }
        self.state = RelayState::Erred;
        self.outcome = RelayOutcome::Failed;
        if let Some(tx) = &self.tx {
            // A dropped receiver has nobody left to tell
            let _ = tx.send(Err(err)).await;
        }
        self.close();
    }

    fn close(&mut self) {
        if self.state == RelayState::Closed {
            return;
        }
        self.tx.take();
        self.state = RelayState::Closed;
    }
}

/// Drain `upstream` into `tx` until the stream ends, fails, or the receiver is dropped
pub async fn run_relay(
    mut upstream: BoxStream<'static, Result<String>>,
    tx: mpsc::Sender<Result<String>>,
) -> RelaySummary {
    let mut relay = Relay::new(tx);

    while relay.is_open() {
        match upstream.next().await {
            Some(Ok(fragment)) => relay.forward(fragment).await,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Completion stream failed mid-response");
                relay.fail(err).await;
            }
            None => relay.close(),
        }
    }

    let summary = RelaySummary {
        outcome: relay.outcome,
        forwarded: relay.forwarded,
    };
    tracing::debug!(
        outcome = ?summary.outcome,
        fragments = summary.forwarded,
        "Relay closed"
    );
    summary
}

/// Spawn a relay task and return the consumer side
pub fn spawn_relay(upstream: BoxStream<'static, Result<String>>, buffer: usize) -> ResponseStream {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    tokio::spawn(run_relay(upstream, tx));
    ResponseStream { rx }
}

/// Fragments of a streamed answer, in provider order
///
/// Yields at most one error, after which the stream ends.
pub struct ResponseStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl Stream for ResponseStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ============================================================================
// Tests
// ============================================================================
