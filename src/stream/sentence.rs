//! Sentence-boundary detection over a live-growing string
//!
//! Assistant text arrives as deltas of arbitrary length. The splitter keeps
//! the suffix since the last boundary and emits each completed sentence as
//! soon as its terminator appears. Terminators cover Latin punctuation, the
//! danda marks used by Telugu and Devanagari text, and the newline.

/// Characters that end a narratable sentence
const BOUNDARIES: [char; 6] = ['.', '!', '?', '।', '॥', '\n'];

/// Incremental sentence splitter
///
/// A single delta may complete zero, one, or several sentences.
#[derive(Debug, Default)]
pub struct SentenceSplitter {
    pending: String,
}

impl SentenceSplitter {
    /// Create a splitter with an empty pending line
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return the sentences it completed, in order
    ///
    /// Each returned sentence includes its boundary character and any
    /// leading whitespace carried over from the previous boundary.
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.pending.push_str(delta);

        let mut complete = Vec::new();
        while let Some(pos) = self.pending.find(BOUNDARIES) {
            let width = self.pending[pos..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            let sentence: String = self.pending.drain(..pos + width).collect();
            complete.push(sentence);
        }
        complete
    }

    /// Text accumulated since the last boundary
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Take the remainder as a final sentence, if it holds any visible text
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Drop any pending text (start of a new exchange)
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sentences_in_order() {
        let mut splitter = SentenceSplitter::new();
        let sentences = splitter.push("Hello world. How are you? ");
        assert_eq!(sentences, vec!["Hello world.", " How are you?"]);
        assert_eq!(splitter.pending(), " ");
    }

    #[test]
    fn sentence_built_from_many_deltas() {
        let mut splitter = SentenceSplitter::new();
        assert!(splitter.push("Shiva ").is_empty());
        assert!(splitter.push("has a third").is_empty());
        let sentences = splitter.push(" eye. And");
        assert_eq!(sentences, vec!["Shiva has a third eye."]);
        assert_eq!(splitter.pending(), " And");
    }

    #[test]
    fn danda_marks_are_boundaries() {
        let mut splitter = SentenceSplitter::new();
        let sentences = splitter.push("ఇది ఒక వాక్యం। రెండవది॥");
        assert_eq!(sentences, vec!["ఇది ఒక వాక్యం।", " రెండవది॥"]);
    }

    #[test]
    fn newline_is_a_boundary() {
        let mut splitter = SentenceSplitter::new();
        let sentences = splitter.push("line one\nline two");
        assert_eq!(sentences, vec!["line one\n"]);
        assert_eq!(splitter.pending(), "line two");
    }

    #[test]
    fn flush_returns_the_remainder_once() {
        let mut splitter = SentenceSplitter::new();
        splitter.push("no terminator yet");
        assert_eq!(splitter.flush(), Some("no terminator yet".to_string()));
        assert_eq!(splitter.flush(), None);
    }

    #[test]
    fn flush_skips_whitespace_only_remainder() {
        let mut splitter = SentenceSplitter::new();
        splitter.push("Done here. ");
        assert_eq!(splitter.flush(), None);
    }

    #[test]
    fn reset_discards_pending_text() {
        let mut splitter = SentenceSplitter::new();
        splitter.push("half a sent");
        splitter.reset();
        assert_eq!(splitter.pending(), "");
    }
}
