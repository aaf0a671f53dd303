//! Incremental UTF-8 decoding for byte streams
//!
//! Network chunks can split a multi-byte sequence anywhere. The decoder
//! carries the incomplete tail across calls and only substitutes the
//! replacement character for sequences that are invalid once complete.

/// Streaming UTF-8 decoder
///
/// Feed arbitrary byte chunks with [`Utf8Decoder::decode`]; call
/// [`Utf8Decoder::finish`] after the last chunk to flush a dangling
/// incomplete sequence.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a new decoder with no carried-over bytes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&rest[..valid]) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        // Truly invalid bytes: substitute and keep going
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid + bad..];
                        }
                        // Incomplete sequence at the end: carry it over
                        None => {
                            self.pending = rest[valid..].to_vec();
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush the decoder at end of stream
    ///
    /// A sequence that is still incomplete when the stream ends is invalid
    /// by definition and decodes to a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}
