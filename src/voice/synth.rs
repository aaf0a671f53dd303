//! HTTP speech synthesis backend
//!
//! Synthesizes narration through the OpenAI speech API and plays the MP3
//! result through the local output device. Pitch has no effect with this
//! backend; rate maps to the API's speed parameter and volume is applied as
//! playback gain.

use secrecy::{ExposeSecret, SecretString};

use crate::voice::playback::AudioPlayback;
use crate::voice::speech::{SpeechService, UtteranceParams, VoiceInfo};
use crate::{Error, Result};

/// Speech synthesis endpoint
const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Synthesizes and plays utterances over HTTP TTS
pub struct HttpSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    voice: String,
    lang_code: String,
    playback: AudioPlayback,
}

impl HttpSpeech {
    /// Create a new HTTP speech backend
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or no audio output device
    /// is available.
    pub fn new(
        api_key: SecretString,
        model: String,
        voice: String,
        lang_code: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("TTS API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            voice,
            lang_code,
            playback: AudioPlayback::new()?,
        })
    }

    async fn synthesize(&self, text: &str, speed: f32) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed,
        };

        let response = self
            .client
            .post(SPEECH_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Speech(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait::async_trait]
impl SpeechService for HttpSpeech {
    async fn speak(&self, text: &str, params: &UtteranceParams) -> Result<()> {
        let audio = self.synthesize(text, params.rate).await?;
        self.playback.play_mp3(&audio, params.volume)
    }

    async fn list_voices(&self) -> Vec<VoiceInfo> {
        // The API has named voices without language metadata; expose the
        // configured voice under the configured language tag
        vec![VoiceInfo {
            lang: self.lang_code.clone(),
            name: self.voice.clone(),
        }]
    }

    fn cancel_all(&self) {
        self.playback.stop();
    }

    fn prepare(&self) {
        self.playback.arm();
    }
}
