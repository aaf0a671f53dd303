//! Sequential narration queue
//!
//! Sentences are narrated strictly in arrival order, one at a time, by a
//! single worker task. The queue survives across exchanges; `cancel` empties
//! it and stops the current utterance. The worker is an explicit
//! `Idle → Playing → Idle` state machine rather than callback recursion.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use crate::config::LanguageConfig;
use crate::voice::speech::{SpeechService, UtteranceParams, select_voice};

/// Speaking rate multiplier, tuned for narration clarity
const SPEECH_RATE: f32 = 0.85;

/// Pitch multiplier
const SPEECH_PITCH: f32 = 1.15;

/// Playback volume
const SPEECH_VOLUME: f32 = 1.0;

/// Cleaned sentences at or below this many characters are discarded
const MIN_SENTENCE_CHARS: usize = 2;

/// Poll interval for [`Narrator::wait_idle`]
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Playback state of the worker
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PlayState {
    Idle,
    Playing,
}

#[derive(Debug)]
struct NarratorState {
    queue: VecDeque<String>,
    state: PlayState,
    /// Bumped on cancel so a stale utterance completion cannot clear the
    /// playing slot of a newer generation
    epoch: u64,
}

/// Handle to the narration queue and its worker task
#[derive(Clone)]
pub struct Narrator {
    state: Arc<Mutex<NarratorState>>,
    wake: Arc<Notify>,
    service: Arc<dyn SpeechService>,
    language: Arc<LanguageConfig>,
}

impl Narrator {
    /// Create the queue and spawn its worker task
    #[must_use]
    pub fn spawn(service: Arc<dyn SpeechService>, language: LanguageConfig) -> Self {
        let narrator = Self {
            state: Arc::new(Mutex::new(NarratorState {
                queue: VecDeque::new(),
                state: PlayState::Idle,
                epoch: 0,
            })),
            wake: Arc::new(Notify::new()),
            service,
            language: Arc::new(language),
        };
        tokio::spawn(narrator.clone().run());
        narrator
    }

    /// Enqueue a sentence for narration
    ///
    /// Presentation markup is stripped first; sentences that clean down to
    /// nothing meaningful are dropped.
    pub async fn add(&self, sentence: &str) {
        let clean = clean_markup(sentence);
        if clean.chars().count() <= MIN_SENTENCE_CHARS {
            return;
        }

        let mut state = self.state.lock().await;
        state.queue.push_back(clean);
        drop(state);
        self.wake.notify_one();
    }

    /// Empty the queue and stop any in-progress utterance
    ///
    /// Idempotent; safe to call when nothing is playing.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        state.queue.clear();
        state.state = PlayState::Idle;
        state.epoch += 1;
        drop(state);
        self.service.cancel_all();
    }

    /// Whether an utterance is currently playing
    pub async fn is_playing(&self) -> bool {
        self.state.lock().await.state == PlayState::Playing
    }

    /// Number of sentences waiting behind the current utterance
    pub async fn queued(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Wait until the queue is empty and nothing is playing
    pub async fn wait_idle(&self) {
        loop {
            {
                let state = self.state.lock().await;
                if state.state == PlayState::Idle && state.queue.is_empty() {
                    return;
                }
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    async fn run(self) {
        loop {
            self.wake.notified().await;
            self.drain().await;
        }
    }

    /// Play queued sentences back-to-back until the queue empties
    async fn drain(&self) {
        loop {
            let (sentence, epoch) = {
                let mut state = self.state.lock().await;
                if state.state == PlayState::Playing {
                    return;
                }
                let Some(sentence) = state.queue.pop_front() else {
                    return;
                };
                state.state = PlayState::Playing;
                // Re-arm the backend while the lock is held, so a cancel
                // landing after this point still reaches the playback layer
                self.service.prepare();
                (sentence, state.epoch)
            };

            // Building the params can take a while (lazy voice loading); a
            // cancel may have landed in the meantime
            let params = self.utterance_params().await;
            if self.state.lock().await.epoch != epoch {
                continue;
            }
            if let Err(err) = self.service.speak(&sentence, &params).await {
                // Recover locally: clear the slot and move on
                tracing::warn!(error = %err, "narration failed, draining next sentence");
            }

            let mut state = self.state.lock().await;
            if state.epoch == epoch {
                state.state = PlayState::Idle;
            }
        }
    }

    /// Build delivery parameters, re-selecting the voice lazily
    async fn utterance_params(&self) -> UtteranceParams {
        let voices = self.service.list_voices().await;
        let voice = select_voice(
            &voices,
            &self.language.target,
            &self.language.target_name,
            &self.language.fallback,
        );
        let lang = voice
            .as_ref()
            .map_or_else(|| self.language.target_code.clone(), |v| v.lang.clone());
        UtteranceParams {
            voice,
            lang,
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
            volume: SPEECH_VOLUME,
        }
    }
}

/// Strip presentation markup before narration
fn clean_markup(text: &str) -> String {
    let mut clean = text.replace("**", "").replace("##", "").replace("---", "");
    clean.retain(|c| c != '─');
    clean.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_markup_strips_formatting() {
        assert_eq!(clean_markup("**bold** text"), "bold text");
        assert_eq!(clean_markup("## heading."), "heading.");
        assert_eq!(clean_markup("─────────────────"), "");
        assert_eq!(clean_markup("  plain.  "), "plain.");
    }

    #[test]
    fn clean_markup_keeps_separator_free_text() {
        assert_eq!(clean_markup("a --- b"), "a  b");
    }
}
