//! Chat session orchestration
//!
//! A [`ChatSession`] owns the conversation, the narration queue, and the
//! per-exchange streaming state. All mutation happens through its async
//! methods; cancellation is an armed-per-send watch signal shared with
//! [`CancelHandle`] so a UI task can abort an in-flight exchange.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::Result;
use crate::chat::transport::ChatClient;
use crate::chat::{ChatRequest, Message, WireMessage};
use crate::stream::{ChunkOutcome, SentenceSplitter, StreamAssembler};
use crate::voice::Narrator;

/// Incremental updates published to the UI while an exchange runs
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A user message was appended
    UserMessage(Message),
    /// The empty assistant placeholder was appended
    AssistantStarted {
        /// Placeholder message id
        id: Uuid,
    },
    /// A text delta was appended to the assistant message
    AssistantDelta {
        /// Assistant message id
        id: Uuid,
        /// The appended fragment
        delta: String,
    },
    /// The assistant message is complete and immutable
    AssistantCompleted {
        /// Assistant message id
        id: Uuid,
    },
}

/// Aborts an in-flight exchange and its narration from another task
#[derive(Clone)]
pub struct CancelHandle {
    abort: Arc<watch::Sender<bool>>,
    narrator: Narrator,
}

impl CancelHandle {
    /// Abort the current exchange, if any, and silence narration
    pub async fn cancel(&self) {
        self.abort.send_replace(true);
        self.narrator.cancel().await;
    }
}

/// One chat session: conversation, streaming, and narration
pub struct ChatSession {
    client: ChatClient,
    narrator: Narrator,
    messages: Vec<Message>,
    abort: Arc<watch::Sender<bool>>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    image_prompt: String,
}

impl ChatSession {
    /// Create a session over the given transport and narration queue
    ///
    /// `image_prompt` is the stock user text substituted when a send
    /// carries only an image.
    #[must_use]
    pub fn new(client: ChatClient, narrator: Narrator, image_prompt: String) -> Self {
        let (abort, _) = watch::channel(false);
        Self {
            client,
            narrator,
            messages: Vec::new(),
            abort: Arc::new(abort),
            events: None,
            image_prompt,
        }
    }

    /// Subscribe to incremental session updates
    ///
    /// Replaces any previous subscription.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Handle for aborting from another task
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            abort: Arc::clone(&self.abort),
            narrator: self.narrator.clone(),
        }
    }

    /// Messages in the conversation, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Send a user message and stream the assistant's reply
    ///
    /// No-op when `text` trims to nothing and no image is attached. Resets
    /// the exchange state, appends the user message and an empty assistant
    /// placeholder, then drives the stream until the source ends or the
    /// exchange is cancelled. Cancellation is silent: the partial text is
    /// kept and `Ok` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error for gateway rejections and transport failures that
    /// happen before any assistant text arrived.
    pub async fn send(&mut self, text: &str, image: Option<String>) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() && image.is_none() {
            return Ok(());
        }

        // New exchange: silence any previous narration and re-arm the abort
        self.narrator.cancel().await;
        self.abort.send_replace(false);
        let mut abort_rx = self.abort.subscribe();

        let content = if trimmed.is_empty() {
            self.image_prompt.clone()
        } else {
            trimmed.to_string()
        };
        let user = Message::user(content, image.clone());
        self.emit(SessionEvent::UserMessage(user.clone()));
        self.messages.push(user);

        let request = ChatRequest {
            messages: self
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: m.text.clone(),
                })
                .collect(),
            image_base64: image,
        };

        // A failure here precedes the placeholder, so nothing to unwind
        let response = self.client.stream_chat(&request).await?;

        let placeholder = Message::assistant_placeholder();
        let assistant_id = placeholder.id;
        self.messages.push(placeholder);
        self.emit(SessionEvent::AssistantStarted { id: assistant_id });

        let mut assembler = StreamAssembler::new();
        let mut stream = response.bytes_stream();
        let mut cancelled = false;

        loop {
            tokio::select! {
                _ = abort_rx.changed() => {
                    tracing::debug!("exchange cancelled mid-stream");
                    cancelled = true;
                    break;
                }
                chunk = stream.next() => match chunk {
                    None => break,
                    Some(Ok(bytes)) => {
                        let outcome = assembler.push_chunk(&bytes);
                        self.apply_outcome(assistant_id, outcome).await;
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "chat stream interrupted");
                        if assembler.text().is_empty() {
                            // Nothing arrived: surface the failure and drop
                            // the untouched placeholder
                            self.messages.pop();
                            return Err(err.into());
                        }
                        break;
                    }
                }
            }
        }

        if !cancelled {
            let outcome = assembler.finish();
            self.apply_outcome(assistant_id, outcome).await;
        }

        self.emit(SessionEvent::AssistantCompleted { id: assistant_id });
        Ok(())
    }

    /// Abort the in-flight exchange and silence narration
    ///
    /// Silent and idempotent; partial assistant text is kept.
    pub async fn cancel(&self) {
        self.abort.send_replace(true);
        self.narrator.cancel().await;
    }

    /// Drop the whole conversation and cancel everything in flight
    pub async fn clear(&mut self) {
        self.messages.clear();
        self.cancel().await;
    }

    /// Narrate a full reply on demand, replacing any current narration
    pub async fn narrate(&self, text: &str) {
        self.narrator.cancel().await;

        let mut splitter = SentenceSplitter::new();
        for sentence in splitter.push(text) {
            self.narrator.add(&sentence).await;
        }
        if let Some(rest) = splitter.flush() {
            self.narrator.add(&rest).await;
        }
    }

    async fn apply_outcome(&mut self, id: Uuid, outcome: ChunkOutcome) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            for delta in &outcome.deltas {
                message.text.push_str(delta);
            }
        }
        for delta in outcome.deltas {
            self.emit(SessionEvent::AssistantDelta { id, delta });
        }
        for sentence in outcome.sentences {
            self.narrator.add(&sentence).await;
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
