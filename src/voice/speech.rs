//! Speech service abstraction and voice selection

use async_trait::async_trait;

use crate::Result;

/// A voice offered by the synthesis backend
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoiceInfo {
    /// BCP-47-ish language tag, e.g. `te-IN`
    pub lang: String,
    /// Human-readable voice label
    pub name: String,
}

/// Per-utterance delivery parameters
#[derive(Clone, Debug)]
pub struct UtteranceParams {
    /// Selected voice, if any matched the language preferences
    pub voice: Option<VoiceInfo>,
    /// Language tag used when no voice matched
    pub lang: String,
    /// Speaking rate multiplier
    pub rate: f32,
    /// Pitch multiplier
    pub pitch: f32,
    /// Volume in `0.0..=1.0`
    pub volume: f32,
}

/// A synthesis backend that can play one utterance at a time
///
/// Implementations own the audio channel; callers never overlap utterances
/// because the narration queue serializes them.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Speak `text`, resolving when the utterance finishes or fails
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis or playback fails; an utterance
    /// interrupted by [`SpeechService::cancel_all`] is not an error.
    async fn speak(&self, text: &str, params: &UtteranceParams) -> Result<()>;

    /// Voices currently available
    ///
    /// Backends may load their voice list asynchronously; an empty list
    /// means "not loaded yet", not "no voices exist".
    async fn list_voices(&self) -> Vec<VoiceInfo>;

    /// Stop any in-progress utterance; safe to call when nothing is playing
    ///
    /// The stop request stays raised until [`SpeechService::prepare`] is
    /// called, so an utterance dequeued but not yet playing is suppressed
    /// rather than missed.
    fn cancel_all(&self);

    /// Re-arm the backend for the next utterance
    ///
    /// The narration queue calls this right after dequeuing a sentence and
    /// before synthesis starts, clearing any pending stop request.
    fn prepare(&self) {}
}

/// Voice labels that suggest a feminine voice
const FEMININE_HINTS: [&str; 2] = ["female", "woman"];

fn matches_lang(voice: &VoiceInfo, lang: &str) -> bool {
    voice.lang.contains(lang)
}

/// Some backends ship voices with the language only in the label, not the
/// tag, so the name is matched against a lowercase language-name hint too
fn matches_target(voice: &VoiceInfo, lang: &str, name_hint: &str) -> bool {
    matches_lang(voice, lang)
        || (!name_hint.is_empty() && voice.name.to_lowercase().contains(name_hint))
}

fn sounds_feminine(voice: &VoiceInfo) -> bool {
    let name = voice.name.to_lowercase();
    FEMININE_HINTS.iter().any(|hint| name.contains(hint))
}

/// Pick the best available voice for narration
///
/// Preference order: a feminine voice in the target language, any voice in
/// the target language, a feminine voice in the fallback language, none.
/// A voice is in the target language when its tag contains `target_lang` or
/// its label contains `target_name`. Re-evaluated per utterance because
/// voice lists load lazily.
#[must_use]
pub fn select_voice(
    voices: &[VoiceInfo],
    target_lang: &str,
    target_name: &str,
    fallback_lang: &str,
) -> Option<VoiceInfo> {
    voices
        .iter()
        .find(|v| matches_target(v, target_lang, target_name) && sounds_feminine(v))
        .or_else(|| {
            voices
                .iter()
                .find(|v| matches_target(v, target_lang, target_name))
        })
        .or_else(|| {
            voices
                .iter()
                .find(|v| matches_lang(v, fallback_lang) && sounds_feminine(v))
        })
        .cloned()
}

/// Speech service that discards every utterance immediately
///
/// Used for muted or headless runs so the narration queue still drains.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSpeech;

#[async_trait]
impl SpeechService for NullSpeech {
    async fn speak(&self, _text: &str, _params: &UtteranceParams) -> Result<()> {
        Ok(())
    }

    async fn list_voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn cancel_all(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(lang: &str, name: &str) -> VoiceInfo {
        VoiceInfo {
            lang: lang.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn prefers_feminine_target_voice() {
        let voices = vec![
            voice("te-IN", "Telugu Standard"),
            voice("te-IN", "Telugu Female A"),
            voice("hi-IN", "Hindi Female B"),
        ];
        let chosen = select_voice(&voices, "te", "telugu", "hi").unwrap();
        assert_eq!(chosen.name, "Telugu Female A");
    }

    #[test]
    fn falls_back_to_any_target_voice() {
        let voices = vec![voice("hi-IN", "Hindi Female"), voice("te-IN", "Telugu")];
        let chosen = select_voice(&voices, "te", "telugu", "hi").unwrap();
        assert_eq!(chosen.name, "Telugu");
    }

    #[test]
    fn name_hint_matches_when_lang_metadata_is_missing() {
        let voices = vec![voice("", "Telugu (India)"), voice("hi-IN", "Hindi Female")];
        let chosen = select_voice(&voices, "te", "telugu", "hi").unwrap();
        assert_eq!(chosen.name, "Telugu (India)");
    }

    #[test]
    fn falls_back_to_feminine_fallback_voice() {
        let voices = vec![voice("hi-IN", "Hindi Woman"), voice("en-US", "English")];
        let chosen = select_voice(&voices, "te", "telugu", "hi").unwrap();
        assert_eq!(chosen.name, "Hindi Woman");
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert_eq!(select_voice(&[], "te", "telugu", "hi"), None);
    }

    #[test]
    fn masculine_fallback_voice_is_not_selected() {
        let voices = vec![voice("hi-IN", "Hindi Standard")];
        assert_eq!(select_voice(&voices, "te", "telugu", "hi"), None);
    }
}
