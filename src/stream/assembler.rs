//! Per-exchange reassembly state
//!
//! Glues the decoder, the event buffer, and the sentence splitter together:
//! byte chunks go in, applied deltas and deduplicated completed sentences
//! come out. One assembler lives for exactly one exchange.

use std::collections::HashSet;

use crate::stream::decode::Utf8Decoder;
use crate::stream::sentence::SentenceSplitter;
use crate::stream::sse::{EventBuffer, Record};

/// What one byte chunk (or the final flush) produced
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    /// Text deltas applied, in arrival order
    pub deltas: Vec<String>,
    /// Sentences completed by this chunk, deduplicated, in detection order
    pub sentences: Vec<String>,
    /// The `[DONE]` sentinel was seen in this read
    pub done: bool,
}

/// Stream reassembler for a single exchange
#[derive(Debug, Default)]
pub struct StreamAssembler {
    decoder: Utf8Decoder,
    events: EventBuffer,
    splitter: SentenceSplitter,
    /// Sentences already forwarded this exchange; guards the final flush
    /// against re-narrating text the incremental scan already emitted
    spoken: HashSet<String>,
    text: String,
}

impl StreamAssembler {
    /// Create a fresh assembler for a new exchange
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process the next network chunk
    pub fn push_chunk(&mut self, chunk: &[u8]) -> ChunkOutcome {
        let text = self.decoder.decode(chunk);
        self.events.feed(&text);

        let mut outcome = ChunkOutcome::default();
        while let Some(record) = self.events.next_record() {
            match record {
                Record::Done => {
                    outcome.done = true;
                    break;
                }
                Record::Delta(delta) => self.apply_delta(&delta, &mut outcome),
            }
        }
        outcome
    }

    /// Flush once the byte source has ended
    ///
    /// Drains the trailing buffer with the lenient record logic, then
    /// forwards any remaining pending line as the final sentence.
    pub fn finish(&mut self) -> ChunkOutcome {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            self.events.feed(&tail);
        }

        let mut outcome = ChunkOutcome::default();
        for delta in self.events.finish() {
            self.apply_delta(&delta, &mut outcome);
        }
        if let Some(rest) = self.splitter.flush() {
            if self.spoken.insert(rest.clone()) {
                outcome.sentences.push(rest);
            }
        }
        outcome
    }

    /// Full assistant text reassembled so far
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn apply_delta(&mut self, delta: &str, outcome: &mut ChunkOutcome) {
        self.text.push_str(delta);
        outcome.deltas.push(delta.to_string());

        for sentence in self.splitter.push(delta) {
            if self.spoken.insert(sentence.clone()) {
                outcome.sentences.push(sentence);
            }
        }
    }
}
