// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution output fan-out.
//!
//! Every chunk a process emits is appended to the execution's transcript and
//! pushed to live subscribers. A subscriber first replays the transcript as
//! it stood when it subscribed, then follows live chunks; both happen under
//! one lock, so no chunk is missed or delivered twice across the seam.
//!
//! Live delivery goes through a bounded broadcast ring. A subscriber that
//! falls more than `backlog` chunks behind is resynced from the transcript
//! instead of stalling the publisher.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// One chunk of process output, numbered from 0 in emission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub seq: u64,
    pub text: Arc<str>,
}

struct ChannelState {
    transcript: Vec<OutputChunk>,
    /// `None` once closed
    live: Option<broadcast::Sender<OutputChunk>>,
}

/// Broadcaster for one execution's output
#[derive(Clone)]
pub struct OutputChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl OutputChannel {
    pub fn new(backlog: usize) -> Self {
        let (live, _) = broadcast::channel(backlog.max(1));
        Self {
            state: Arc::new(Mutex::new(ChannelState {
                transcript: Vec::new(),
                live: Some(live),
            })),
        }
    }

    /// Append `text` and deliver it to live subscribers.
    ///
    /// Returns the chunk's sequence number, or `None` when the channel is
    /// already closed and the chunk was dropped.
    pub fn publish(&self, text: impl Into<Arc<str>>) -> Option<u64> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let live = state.live.as_ref()?;
        let chunk = OutputChunk {
            seq: state.transcript.len() as u64,
            text: text.into(),
        };
        // No receivers is fine: late subscribers replay from the transcript
        let _ = live.send(chunk.clone());
        let seq = chunk.seq;
        state.transcript.push(chunk);
        Some(seq)
    }

    /// Subscribe: replay everything published so far, then follow live.
    ///
    /// On a closed channel the subscription replays the transcript and ends.
    pub fn subscribe(&self) -> Subscription {
        let state = self.state.lock();
        Subscription {
            replay: state.transcript.iter().cloned().collect(),
            next_seq: state.transcript.len() as u64,
            live: state.live.as_ref().map(broadcast::Sender::subscribe),
            channel: self.clone(),
        }
    }

    /// End the stream. Idempotent; returns whether this call closed it.
    pub fn close(&self) -> bool {
        self.state.lock().live.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().live.is_none()
    }

    /// Number of chunks published
    pub fn len(&self) -> usize {
        self.state.lock().transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole transcript as one string
    pub fn transcript(&self) -> String {
        self.state
            .lock()
            .transcript
            .iter()
            .map(|c| c.text.as_ref())
            .collect()
    }

    fn chunks_from(&self, seq: u64) -> Vec<OutputChunk> {
        let state = self.state.lock();
        let start = (seq as usize).min(state.transcript.len());
        state.transcript[start..].to_vec()
    }
}

/// One subscriber's view of an [`OutputChannel`]
pub struct Subscription {
    replay: VecDeque<OutputChunk>,
    /// Sequence number of the next chunk this subscriber has not seen
    next_seq: u64,
    live: Option<broadcast::Receiver<OutputChunk>>,
    channel: OutputChannel,
}

impl Subscription {
    /// Next chunk in order, or `None` once the channel is closed and drained.
    pub async fn next(&mut self) -> Option<OutputChunk> {
        loop {
            if let Some(chunk) = self.replay.pop_front() {
                self.next_seq = self.next_seq.max(chunk.seq + 1);
                return Some(chunk);
            }
            let live = self.live.as_mut()?;
            match live.recv().await {
                Ok(chunk) if chunk.seq < self.next_seq => continue,
                Ok(chunk) => {
                    self.next_seq = chunk.seq + 1;
                    return Some(chunk);
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, from_seq = self.next_seq, "subscriber lagged, resyncing");
                    self.replay.extend(self.channel.chunks_from(self.next_seq));
                }
                Err(RecvError::Closed) => {
                    self.live = None;
                    return None;
                }
            }
        }
    }

    /// Drain the rest of the stream into one string.
    pub async fn read_to_end(mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(&chunk.text);
        }
        text
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
