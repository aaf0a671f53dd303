//! Stream reassembly: bytes in, deltas and completed sentences out
//!
//! Pipeline order: [`decode::Utf8Decoder`] turns raw chunks into text,
//! [`sse::EventBuffer`] turns text into chat records, and
//! [`sentence::SentenceSplitter`] turns accumulated deltas into narratable
//! sentences.

pub mod assembler;
pub mod decode;
pub mod sentence;
pub mod sse;

pub use assembler::{ChunkOutcome, StreamAssembler};
pub use decode::Utf8Decoder;
pub use sentence::SentenceSplitter;
pub use sse::{EventBuffer, Record, StreamChunk};
