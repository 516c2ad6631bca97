//! Conversation history and the chat-completion collaborator used by the
//! context-aware fallback.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CommanderError, CommanderResult};

/// Number of turns forwarded to the chat model by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Upper bound on a single chat request.
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Speaker of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One utterance in the running conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// In-memory, ordered conversation log.
#[derive(Clone, Debug, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// Appends a turn to the end of the conversation.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ConversationTurn::new(role, content));
    }

    /// Returns at most the last `limit` turns, oldest first.
    pub fn recent(&self, limit: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    /// Every turn, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Generative model that continues a conversation.
pub trait ChatModel {
    /// Produces the assistant's next message.
    ///
    /// # Arguments
    /// * `preamble` - Optional system instruction sent ahead of the turns.
    /// * `turns` - Conversation window, oldest first, ending with the user turn.
    ///
    /// # Errors
    /// Returns [`CommanderError`] on transport, status or decoding failures.
    fn complete(
        &self,
        preamble: Option<&str>,
        turns: &[ConversationTurn],
    ) -> CommanderResult<String>;
}

/// Chat message structure on the wire.
#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request body for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Blocking client for OpenAI-compatible chat endpoints (OpenAI, Ollama's
/// `/v1` API, and similar).
pub struct OpenAiChat {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChat {
    /// Builds a client for `url` authenticating with `api_key`.
    ///
    /// # Errors
    /// Returns [`CommanderError::Http`] when the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> CommanderResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
        })
    }
}

impl ChatModel for OpenAiChat {
    fn complete(
        &self,
        preamble: Option<&str>,
        turns: &[ConversationTurn],
    ) -> CommanderResult<String> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(system) = preamble {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.extend(turns.iter().map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(model = %self.model, turns = turns.len(), "sending chat request");
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CommanderError::Status {
                service: "chat endpoint",
                status: status.as_u16(),
            });
        }
        let body: ChatResponse = response.json()?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(CommanderError::MalformedResponse("chat endpoint"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_returns_tail_window() {
        let mut conversation = Conversation::default();
        for i in 0..14 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            conversation.push(role, format!("turn {}", i));
        }
        let window = conversation.recent(DEFAULT_HISTORY_LIMIT);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].content, "turn 4");
        assert_eq!(window[9].content, "turn 13");
        assert_eq!(conversation.recent(100).len(), 14);
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = ConversationTurn::new(Role::Assistant, "hi");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn openai_chat_sends_preamble_and_parses_reply() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "what is rust"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  A language.  "}}]}"#)
            .create();

        let chat = OpenAiChat::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-key",
            "gpt-3.5-turbo",
            0.7,
            150,
        )
        .unwrap();
        let turns = [ConversationTurn::new(Role::User, "what is rust")];
        let reply = chat.complete(Some("be brief"), &turns).unwrap();
        assert_eq!(reply, "A language.");
        mock.assert();
    }

    #[test]
    fn openai_chat_maps_error_status() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .create();
        let chat = OpenAiChat::new(format!("{}/chat", server.url()), "k", "m", 0.7, 150).unwrap();
        let err = chat
            .complete(None, &[ConversationTurn::new(Role::User, "hello")])
            .unwrap_err();
        assert!(matches!(err, CommanderError::Status { status: 500, .. }));
    }

    #[test]
    fn openai_chat_rejects_empty_choices() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create();
        let chat = OpenAiChat::new(format!("{}/chat", server.url()), "k", "m", 0.7, 150).unwrap();
        let err = chat
            .complete(None, &[ConversationTurn::new(Role::User, "hello")])
            .unwrap_err();
        assert!(matches!(err, CommanderError::MalformedResponse(_)));
    }
}
