//! Shared test helpers: a recording speech backend and stream builders

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use vaani::{Error, Result, SpeechService, UtteranceParams, VoiceInfo};

/// Speech backend that records utterances instead of playing them
///
/// Tracks how many utterances are in flight at once so tests can assert
/// that playback never overlaps.
#[derive(Default)]
pub struct RecordingSpeech {
    started: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    params: Mutex<Vec<UtteranceParams>>,
    voices: Vec<VoiceInfo>,
    voice_delay: Duration,
    delay: Duration,
    fail_on: Option<String>,
    cancel: Notify,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingSpeech {
    /// Backend that completes each utterance immediately
    pub fn instant() -> Self {
        Self::default()
    }

    /// Backend where each utterance takes `millis` to play
    pub fn with_delay(millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            ..Self::default()
        }
    }

    /// Backend that fails any utterance containing `marker`
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Backend advertising the given voices
    pub fn with_voices(voices: Vec<VoiceInfo>) -> Self {
        Self {
            voices,
            ..Self::default()
        }
    }

    /// Backend whose voice list takes `millis` to load
    pub fn with_slow_voices(millis: u64) -> Self {
        Self {
            voice_delay: Duration::from_millis(millis),
            ..Self::default()
        }
    }

    /// Utterances that began playing, in order
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Utterances that played to completion, in order
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    /// Parameters of every utterance that began playing
    pub fn params(&self) -> Vec<UtteranceParams> {
        self.params.lock().unwrap().clone()
    }

    /// Highest number of simultaneously playing utterances observed
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechService for RecordingSpeech {
    async fn speak(&self, text: &str, params: &UtteranceParams) -> Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(text.to_string());
        self.params.lock().unwrap().push(params.clone());

        let interrupted = if self.delay.is_zero() {
            false
        } else {
            tokio::select! {
                () = tokio::time::sleep(self.delay) => false,
                () = self.cancel.notified() => true,
            }
        };
        self.active.fetch_sub(1, Ordering::SeqCst);

        if interrupted {
            // A stopped utterance is not an error
            return Ok(());
        }
        if let Some(marker) = &self.fail_on {
            if text.contains(marker) {
                return Err(Error::Speech("injected playback failure".to_string()));
            }
        }
        self.completed.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn list_voices(&self) -> Vec<VoiceInfo> {
        if !self.voice_delay.is_zero() {
            tokio::time::sleep(self.voice_delay).await;
        }
        self.voices.clone()
    }

    fn cancel_all(&self) {
        self.cancel.notify_waiters();
    }
}

/// Build one `data: {json}` line carrying a content delta
pub fn delta_line(text: &str) -> String {
    format!(
        "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n",
        serde_json::to_string(text).unwrap()
    )
}

/// Build a complete event stream from delta texts, ending with `[DONE]`
pub fn full_stream(deltas: &[&str]) -> Vec<u8> {
    let mut raw = String::new();
    for delta in deltas {
        raw.push_str(&delta_line(delta));
    }
    raw.push_str("data: [DONE]\n");
    raw.into_bytes()
}
