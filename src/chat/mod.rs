//! Conversation data model and gateway wire types

pub mod session;
pub mod transport;

pub use session::{CancelHandle, ChatSession, SessionEvent};
pub use transport::ChatClient;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation
///
/// The assistant message of an in-flight exchange is mutated in place as
/// deltas arrive; once the stream ends or errors it is never touched again.
#[derive(Clone, Debug)]
pub struct Message {
    /// Opaque identifier, assigned at creation and never reused
    pub id: Uuid,
    /// Author role
    pub role: Role,
    /// Message text (grows during streaming for assistant messages)
    pub text: String,
    /// Attached image as a base64 data URL, if any
    pub image: Option<String>,
}

impl Message {
    /// Create a user message
    #[must_use]
    pub fn user(text: String, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text,
            image,
        }
    }

    /// Create the empty assistant placeholder for a new exchange
    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: String::new(),
            image: None,
        }
    }
}

/// Wire form of a message sent to the chat gateway
#[derive(Debug, Serialize)]
pub struct WireMessage {
    /// Author role
    pub role: Role,
    /// Message text
    pub content: String,
}

/// Request body for the chat gateway
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Full conversation history, oldest first
    pub messages: Vec<WireMessage>,
    /// Base64 image attached to the latest user message
    #[serde(rename = "imageBase64", skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

/// Error body returned by the gateway on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct GatewayError {
    /// Human-readable description
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn request_omits_absent_image() {
        let request = ChatRequest {
            messages: vec![WireMessage {
                role: Role::User,
                content: "hi".to_string(),
            }],
            image_base64: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("imageBase64"));
        assert!(json.contains("\"content\":\"hi\""));
    }

    #[test]
    fn message_ids_are_unique() {
        let a = Message::user("one".to_string(), None);
        let b = Message::user("one".to_string(), None);
        assert_ne!(a.id, b.id);
    }
}
