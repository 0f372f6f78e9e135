use async_stream::try_stream;
use futures::{Stream, StreamExt};
use reqwest::Response;
use std::pin::Pin;
use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

const FIELD_SEPARATOR: char = ':';
const LINE_FEED: u8 = b'\n';
const CARRIAGE_RETURN: u8 = b'\r';

/// Represents a Server-Sent Event (SSE) with its associated fields.
///
/// Each event can contain:
/// - An optional ID
/// - An optional event type
/// - The event data (required)
/// - An optional retry timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unique identifier for the event
    pub id: Option<String>,
    /// Type of the event (defaults to "message" in SSE spec)
    pub event_type: Option<String>,
    /// The event payload
    pub data: String,
    /// Reconnection time in case of connection failure
    pub retry: Option<Duration>,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event {{ id: {:?}, event_type: {:?}, data: {}, retry: {:?} }}",
            self.id, self.event_type, self.data, self.retry
        )
    }
}

impl Event {
    /// Creates a new empty Event.
    pub const fn new() -> Self {
        Self {
            id: None,
            event_type: None,
            data: String::new(),
            retry: None,
        }
    }
}

/// Incremental decoder for the SSE wire framing.
///
/// Bytes go in via [`feed`](Self::feed) in whatever chunks the transport
/// produces; complete events come out as soon as their terminating blank
/// line has been seen. The decoder buffers raw bytes, so a chunk boundary
/// may fall mid-line or even mid-way through a multi-byte UTF-8 character
/// without affecting the decoded records. One decoder instance serves one
/// connection; it is not restartable.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
    event_type: Option<String>,
    id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    /// Creates a decoder with empty buffers.
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            data_lines: Vec::new(),
            event_type: None,
            id: None,
            retry: None,
        }
    }

    /// Feeds a chunk of bytes and returns every event completed by it,
    /// in wire order. An empty vec means more bytes are needed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing record left unterminated when the byte stream
    /// ends without a final blank line.
    pub fn finish(&mut self) -> Option<Event> {
        if !self.buffer.is_empty() {
            let mut bytes = std::mem::take(&mut self.buffer);
            if bytes.last() == Some(&CARRIAGE_RETURN) {
                bytes.pop();
            }
            let line = String::from_utf8_lossy(&bytes).into_owned();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    /// Removes the next complete line from the buffer, excluding its
    /// `\n` terminator and any trailing `\r`.
    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == LINE_FEED)?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&CARRIAGE_RETURN) {
            line.pop();
        }
        // Lines only become visible once terminated, so a multi-byte
        // character split across chunks is whole by the time it is decoded.
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn process_line(&mut self, line: &str) -> Option<Event> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(FIELD_SEPARATOR) {
            // Comment line, typically a server keep-alive
            return None;
        }

        if let Some((field, value)) = line.split_once(FIELD_SEPARATOR) {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "data" => self.data_lines.push(value.to_string()),
                "event" => self.event_type = Some(value.to_string()),
                "id" => self.id = Some(value.to_string()),
                "retry" => {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
                _ => {} // Ignore unknown fields as per SSE spec
            }
        } else if line == "data" {
            // A lone field name carries an empty value
            self.data_lines.push(String::new());
        }
        None
    }

    /// Emits the accumulated record at a blank line. Blocks that carried
    /// no data lines (comments, bare metadata) dispatch nothing and their
    /// metadata is dropped.
    fn dispatch(&mut self) -> Option<Event> {
        if self.data_lines.is_empty() {
            self.event_type = None;
            self.id = None;
            self.retry = None;
            return None;
        }

        let event = Event {
            id: self.id.take(),
            event_type: self.event_type.take(),
            data: self.data_lines.join("\n"),
            retry: self.retry.take(),
        };
        self.data_lines.clear();
        Some(event)
    }
}

/// Extension trait for converting a Response into a Stream of SSE Events.
pub trait EventSourceExt {
    /// Converts the response into a Stream of Events.
    ///
    /// # Returns
    ///
    /// Returns a pinned Stream that yields Result<Event, `reqwest::Error`>
    fn events(self) -> Pin<Box<dyn Stream<Item = Result<Event, reqwest::Error>> + Send>>;
}

impl EventSourceExt for Response {
    fn events(self) -> Pin<Box<dyn Stream<Item = Result<Event, reqwest::Error>> + Send>> {
        Box::pin(try_stream! {
            let mut stream = self.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                for event in decoder.feed(&chunk) {
                    yield event;
                }
            }

            // Flush a record left open when the connection closes
            if let Some(event) = decoder.finish() {
                yield event;
            }
        })
    }
}
