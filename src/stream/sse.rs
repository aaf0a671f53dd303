//! Reassembly of `text/event-stream` chat records
//!
//! The gateway streams UTF-8 lines of the form `data: {json}` terminated by
//! `data: [DONE]`. Network reads do not align with line or JSON boundaries,
//! so the buffer accumulates text and hands out one parsed record at a time.
//! A `data:` line whose JSON does not yet parse is pushed back and retried
//! once more bytes arrive; a line that fails twice without new input is
//! dropped as malformed.

use serde::Deserialize;

/// Event-data line prefix
const DATA_PREFIX: &str = "data: ";

/// End-of-stream sentinel payload
const DONE_SENTINEL: &str = "[DONE]";

/// One streamed chat-completion chunk
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl StreamChunk {
    /// Text delta carried by this chunk, if any
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }
}

/// A record extracted from the stream buffer
#[derive(Debug, Eq, PartialEq)]
pub enum Record {
    /// An incremental text delta
    Delta(String),
    /// The `[DONE]` sentinel: stop processing lines from this read
    Done,
}

/// Growing text buffer that yields chat records
#[derive(Debug, Default)]
pub struct EventBuffer {
    buf: String,
    /// New bytes arrived since the last parse failure
    fed: bool,
}

impl EventBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text from the next network read
    pub fn feed(&mut self, text: &str) {
        self.buf.push_str(text);
        self.fed = true;
    }

    /// Pull the next record out of the buffer
    ///
    /// Returns `None` when no complete record is available yet; feed more
    /// bytes and call again. Comment lines (`:`), blank lines, and lines
    /// without the `data: ` prefix are skipped silently.
    pub fn next_record(&mut self) -> Option<Record> {
        while let Some(newline) = self.buf.find('\n') {
            let mut line: String = self.buf.drain(..=newline).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();
            if payload == DONE_SENTINEL {
                return Some(Record::Done);
            }

            match serde_json::from_str::<StreamChunk>(payload) {
                Ok(chunk) => {
                    if let Some(text) = chunk.content() {
                        return Some(Record::Delta(text.to_string()));
                    }
                    // Chunk without a content delta: keep scanning
                }
                Err(err) => {
                    if self.fed {
                        // Likely a JSON object split across reads: restore
                        // the line and halt until more bytes arrive
                        self.fed = false;
                        let mut restored = line;
                        restored.push('\n');
                        restored.push_str(&self.buf);
                        self.buf = restored;
                        return None;
                    }
                    tracing::warn!(error = %err, "dropping malformed stream record");
                }
            }
        }
        None
    }

    /// Drain whatever remains once the byte source has ended
    ///
    /// The trailing buffer is reprocessed with the same line logic, except
    /// that a record which still fails to parse is dropped rather than
    /// retried, and `[DONE]` no longer terminates the scan.
    pub fn finish(&mut self) -> Vec<String> {
        if !self.buf.is_empty() && !self.buf.ends_with('\n') {
            self.buf.push('\n');
        }
        self.fed = false;

        let mut deltas = Vec::new();
        while let Some(record) = self.next_record() {
            if let Record::Delta(text) = record {
                deltas.push(text);
            }
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_line(text: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n",
            serde_json::to_string(text).unwrap()
        )
    }

    #[test]
    fn yields_delta_from_complete_line() {
        let mut buf = EventBuffer::new();
        buf.feed(&delta_line("hello"));
        assert_eq!(buf.next_record(), Some(Record::Delta("hello".into())));
        assert_eq!(buf.next_record(), None);
    }

    #[test]
    fn skips_comments_blanks_and_foreign_lines() {
        let mut buf = EventBuffer::new();
        buf.feed(": keepalive\n\nevent: ping\n");
        buf.feed(&delta_line("ok"));
        assert_eq!(buf.next_record(), Some(Record::Delta("ok".into())));
    }

    #[test]
    fn strips_trailing_carriage_return() {
        let mut buf = EventBuffer::new();
        let line = delta_line("crlf").replace('\n', "\r\n");
        buf.feed(&line);
        assert_eq!(buf.next_record(), Some(Record::Delta("crlf".into())));
    }

    #[test]
    fn done_sentinel_stops_the_read() {
        let mut buf = EventBuffer::new();
        buf.feed("data: [DONE]\n");
        buf.feed(&delta_line("after"));
        assert_eq!(buf.next_record(), Some(Record::Done));
    }

    #[test]
    fn split_json_waits_for_more_bytes() {
        let line = delta_line("split across reads");
        let (head, tail) = line.split_at(line.len() / 2);

        let mut buf = EventBuffer::new();
        // The head alone contains no newline, so nothing parses yet
        buf.feed(head);
        assert_eq!(buf.next_record(), None);
        buf.feed(tail);
        assert_eq!(
            buf.next_record(),
            Some(Record::Delta("split across reads".into()))
        );
        assert_eq!(buf.next_record(), None);
    }

    #[test]
    fn newline_inside_payload_triggers_pushback() {
        // The first read ends with a newline mid-JSON: the partial line is
        // extracted, fails to parse, and must be restored intact
        let mut buf = EventBuffer::new();
        buf.feed("data: {\"choices\":[{\"delta\":\n");
        assert_eq!(buf.next_record(), None);
        // No new bytes: second attempt drops the malformed line
        assert_eq!(buf.next_record(), None);
        buf.feed(&delta_line("next"));
        assert_eq!(buf.next_record(), Some(Record::Delta("next".into())));
    }

    #[test]
    fn chunk_without_content_is_skipped() {
        let mut buf = EventBuffer::new();
        buf.feed("data: {\"choices\":[{\"delta\":{}}]}\n");
        buf.feed(&delta_line("real"));
        assert_eq!(buf.next_record(), Some(Record::Delta("real".into())));
    }

    #[test]
    fn empty_content_is_skipped() {
        let mut buf = EventBuffer::new();
        buf.feed(&delta_line(""));
        assert_eq!(buf.next_record(), None);
    }

    #[test]
    fn finish_drains_trailing_buffer_leniently() {
        let mut buf = EventBuffer::new();
        let mut trailing = delta_line("tail");
        trailing.truncate(trailing.len() - 1); // no final newline
        buf.feed("data: {broken\n");
        buf.feed(&trailing);
        // Pushback path first
        assert_eq!(buf.next_record(), None);
        let deltas = buf.finish();
        assert_eq!(deltas, vec!["tail".to_string()]);
    }

    #[test]
    fn finish_ignores_done_and_whitespace() {
        let mut buf = EventBuffer::new();
        buf.feed("data: [DONE]\n   \n");
        assert!(buf.finish().is_empty());
    }
}
