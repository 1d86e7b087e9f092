//! Stream Consumer for server-sent search results.
//!
//! Turns a `text/event-stream` body into an ordered, cancelable sequence of
//! decoded `SearchResult`s. A background pump decodes chunks as they arrive
//! and forwards results over a channel; the owner pulls them with
//! `StreamHandle::next` and may tear the channel down at any time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::services::backend::ByteStream;
use crate::types::errors::StreamError;
use crate::types::search::SearchResult;

/// Data payload the server sends as its last message.
const DONE_SENTINEL: &str = "done";
/// Event name the server uses to close the stream.
const END_EVENT: &str = "end";
/// Longest line the decoder buffers before giving up on the stream.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// What a dispatched event means for the result sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Result(SearchResult),
    End,
    Skip,
}

impl SseEvent {
    pub fn signal(&self) -> StreamSignal {
        if self.event.as_deref() == Some(END_EVENT) || self.data.trim() == DONE_SENTINEL {
            return StreamSignal::End;
        }
        if self.data.is_empty() {
            return StreamSignal::Skip;
        }
        match serde_json::from_str::<SearchResult>(&self.data) {
            Ok(result) => StreamSignal::Result(result),
            Err(e) => {
                warn!(error = %e, "skipping undecodable stream payload");
                StreamSignal::Skip
            }
        }
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; only complete
/// lines are interpreted. An event is dispatched on a blank line.
#[derive(Debug)]
pub struct SseDecoder {
    line_buf: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    max_line: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            line_buf: Vec::new(),
            data: Vec::new(),
            event: None,
            max_line,
        }
    }

    /// Feed raw bytes, returning every event completed by them.
    ///
    /// Fails once a single line grows past the configured limit; the decoder
    /// should not be fed again after that.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, StreamError> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let mut line = std::mem::take(&mut self.line_buf);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                let line = String::from_utf8_lossy(&line).into_owned();
                if let Some(event) = self.process_line(&line) {
                    events.push(event);
                }
            } else {
                if self.line_buf.len() >= self.max_line {
                    self.line_buf.clear();
                    return Err(StreamError::LineTooLong { limit: self.max_line });
                }
                self.line_buf.push(byte);
            }
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id and retry carry nothing the reader uses
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}

/// Cloneable cancel switch for a `StreamHandle`.
#[derive(Debug, Clone)]
pub struct StreamCanceller {
    cancelled: Arc<AtomicBool>,
    pump: AbortHandle,
}

impl StreamCanceller {
    /// Tear down the stream. Safe to call more than once.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("cancelling result stream");
            self.pump.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Owner's end of an open result stream.
pub struct StreamHandle {
    rx: mpsc::UnboundedReceiver<Result<SearchResult, StreamError>>,
    canceller: StreamCanceller,
    finished: bool,
}

impl StreamHandle {
    /// Next decoded result in server order.
    ///
    /// Returns `None` once the server signals the end, after cancellation,
    /// or after a transport failure has been reported. A failure is
    /// reported exactly once, as `Some(Err(..))`.
    pub async fn next(&mut self) -> Option<Result<SearchResult, StreamError>> {
        if self.finished || self.canceller.is_cancelled() {
            return None;
        }
        let item = self.rx.recv().await;
        if self.canceller.is_cancelled() {
            self.finished = true;
            return None;
        }
        match item {
            Some(Ok(result)) => Some(Ok(result)),
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Close the channel. Buffered results are discarded.
    pub fn cancel(&mut self) {
        self.canceller.cancel();
        self.rx.close();
        self.finished = true;
    }

    pub fn canceller(&self) -> StreamCanceller {
        self.canceller.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.canceller.is_cancelled()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

/// Opens result streams over raw event-stream bodies.
pub struct StreamConsumer;

impl StreamConsumer {
    /// Start decoding `source` in the background. Must be called from
    /// within a tokio runtime.
    pub fn open(mut source: ByteStream) -> StreamHandle {
        let (tx, rx) = mpsc::unbounded_channel();

        let pump = tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            let mut delivered = 0usize;
            while let Some(chunk) = source.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(error = %e, delivered, "result stream failed");
                        let _ = tx.send(Err(StreamError::Transport(e.to_string())));
                        return;
                    }
                };
                let events = match decoder.push(&bytes) {
                    Ok(events) => events,
                    Err(e) => {
                        warn!(error = %e, delivered, "result stream failed");
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                for event in events {
                    match event.signal() {
                        StreamSignal::Result(result) => {
                            if tx.send(Ok(result)).is_err() {
                                return;
                            }
                            delivered += 1;
                        }
                        StreamSignal::End => {
                            debug!(delivered, "result stream ended");
                            return;
                        }
                        StreamSignal::Skip => {}
                    }
                }
            }
            debug!(delivered, "result stream closed by server");
        });

        StreamHandle {
            rx,
            canceller: StreamCanceller {
                cancelled: Arc::new(AtomicBool::new(false)),
                pump: pump.abort_handle(),
            },
            finished: false,
        }
    }
}
