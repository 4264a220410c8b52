//! Incremental `data: <json>` frame parser.
//!
//! Chunks arrive at arbitrary byte boundaries. The parser keeps one rolling
//! buffer, emits every complete line it can decode, and holds back the
//! unterminated tail for the next chunk.

use std::collections::VecDeque;

use futures_util::{stream, Stream, StreamExt};
use tracing::{debug, trace, warn};

use crate::constants::frame::{DATA_PREFIX, DONE_SENTINEL};
use crate::error::BackendError;
use crate::events::ThoughtEvent;

/// Classification of a single complete line.
#[derive(Debug)]
pub enum Frame {
    Event(ThoughtEvent),
    Done,
    Malformed(serde_json::Error),
    /// Blank separators and lines without the `data: ` prefix.
    Ignored,
}

pub fn decode_frame(line: &str) -> Frame {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(raw) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    if raw == DONE_SENTINEL {
        return Frame::Done;
    }
    match serde_json::from_str::<ThoughtEvent>(raw) {
        Ok(event) => Frame::Event(event),
        Err(e) => Frame::Malformed(e),
    }
}

#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
    dropped: usize,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the events completed by it, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ThoughtEvent> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        // Everything after the last newline stays buffered for the next chunk.
        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);

        let mut events = Vec::new();
        for line in complete[..last_newline].split(|b| *b == b'\n') {
            let line = String::from_utf8_lossy(line);
            match decode_frame(&line) {
                Frame::Event(event) => events.push(event),
                Frame::Done => trace!("[STREAM] Done sentinel received"),
                Frame::Malformed(e) => {
                    self.dropped += 1;
                    warn!("⚠️ [STREAM] Dropping malformed frame: {}", e);
                }
                Frame::Ignored => {}
            }
        }
        events
    }

    /// Number of `data:` frames dropped because they did not decode.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of stream. An unterminated tail is discarded without decoding.
    pub fn finish(self) {
        if !self.buffer.is_empty() {
            debug!(
                "[STREAM] Discarding {} unterminated bytes at end of stream",
                self.buffer.len()
            );
        }
    }
}

/// Adapt a stream of raw chunks into a lazy stream of decoded events.
///
/// A transport error is yielded once and ends the stream.
pub fn decode_stream<S>(chunks: S) -> impl Stream<Item = Result<ThoughtEvent, BackendError>>
where
    S: Stream<Item = Result<Vec<u8>, BackendError>> + Unpin,
{
    struct State<S> {
        chunks: S,
        parser: Option<FrameParser>,
        ready: VecDeque<ThoughtEvent>,
    }

    let state = State {
        chunks,
        parser: Some(FrameParser::new()),
        ready: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }
            let parser = state.parser.as_mut()?;
            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let events = parser.push(&chunk);
                    state.ready.extend(events);
                }
                Some(Err(e)) => {
                    state.parser = None;
                    return Some((Err(e), state));
                }
                None => {
                    if let Some(parser) = state.parser.take() {
                        parser.finish();
                    }
                    return None;
                }
            }
        }
    })
}
