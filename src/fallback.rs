/*
 * @file fallback.rs
 * @brief Fallback responders for unmatched input
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Replies for utterances that matched no command.

use std::rc::Rc;

use crate::ai::{ChatModel, Conversation, Role, DEFAULT_HISTORY_LIMIT};
use crate::platform::RandomChoice;

/// Reply returned when the chat collaborator fails.
pub const CHAT_FAILURE_REPLY: &str = "I encountered an issue processing that. Please try again.";

/// Produces a reply for unmatched text. Never fails.
pub trait FallbackResponder {
    /// Replies to `text`.
    ///
    /// # Returns
    /// * `String` - Always a reply; failures are rendered, never raised.
    fn respond(&mut self, text: &str) -> String;
}

/// Picks one of three templates that echo the utterance back.
pub struct CannedResponder {
    random: Rc<dyn RandomChoice>,
}

impl CannedResponder {
    pub fn new(random: Rc<dyn RandomChoice>) -> Self {
        Self { random }
    }

    /// Every template the responder can produce for `text`.
    pub fn templates(text: &str) -> [String; 3] {
        [
            format!("I understood '{}', but I'm not sure how to respond to that.", text),
            format!(
                "That's interesting, but I don't have a specific action for '{}'.",
                text
            ),
            format!(
                "I'm still learning what '{}' means. Could you try a different command?",
                text
            ),
        ]
    }
}

impl FallbackResponder for CannedResponder {
    fn respond(&mut self, text: &str) -> String {
        let mut templates = Self::templates(text);
        let index = self.random.choose(templates.len());
        std::mem::take(&mut templates[index.min(templates.len() - 1)])
    }
}

/// Context-aware responder that continues the conversation with a chat model.
///
/// # Details
/// The user turn is recorded before the request and stays in history even
/// when the request fails; the assistant turn is recorded only on success.
pub struct GenerativeResponder {
    model: Box<dyn ChatModel>,
    preamble: Option<String>,
    history: Conversation,
    history_limit: usize,
}

impl GenerativeResponder {
    /// Creates a responder with no preamble and the default history window.
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self {
            model,
            preamble: None,
            history: Conversation::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// System instruction sent ahead of every request.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// Number of most recent turns sent with each request.
    ///
    /// # Details
    /// Clamped to at least one so the current utterance is always sent.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Full conversation recorded so far.
    pub fn history(&self) -> &Conversation {
        &self.history
    }
}

impl FallbackResponder for GenerativeResponder {
    fn respond(&mut self, text: &str) -> String {
        self.history.push(Role::User, text);
        let window = self.history.recent(self.history_limit);
        match self.model.complete(self.preamble.as_deref(), window) {
            Ok(reply) => {
                self.history.push(Role::Assistant, reply.as_str());
                reply
            }
            Err(err) => {
                tracing::error!("chat model error: {}", err);
                CHAT_FAILURE_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ConversationTurn;
    use crate::error::{CommanderError, CommanderResult};
    use crate::platform::FixedChoice;
    use std::cell::RefCell;

    #[test]
    fn canned_templates_echo_input() {
        for index in 0..3 {
            let mut responder = CannedResponder::new(Rc::new(FixedChoice(index)));
            let reply = responder.respond("asdkfjasldkf");
            assert!(reply.contains("asdkfjasldkf"));
            assert_eq!(reply, CannedResponder::templates("asdkfjasldkf")[index]);
        }
    }

    /// Records every window it is given and replies with a counter.
    struct ScriptedModel {
        seen: Rc<RefCell<Vec<Vec<ConversationTurn>>>>,
        fail: bool,
    }

    impl ChatModel for ScriptedModel {
        fn complete(
            &self,
            preamble: Option<&str>,
            turns: &[ConversationTurn],
        ) -> CommanderResult<String> {
            assert_eq!(preamble, Some("be kind"));
            self.seen.borrow_mut().push(turns.to_vec());
            if self.fail {
                return Err(CommanderError::MalformedResponse("scripted"));
            }
            Ok(format!("reply {}", self.seen.borrow().len()))
        }
    }

    fn generative(fail: bool) -> (GenerativeResponder, Rc<RefCell<Vec<Vec<ConversationTurn>>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let model = ScriptedModel {
            seen: Rc::clone(&seen),
            fail,
        };
        (
            GenerativeResponder::new(Box::new(model)).with_preamble("be kind"),
            seen,
        )
    }

    #[test]
    fn generative_records_both_turns() {
        let (mut responder, _) = generative(false);
        assert_eq!(responder.respond("tell me a joke"), "reply 1");
        let turns = responder.history().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ConversationTurn::new(Role::User, "tell me a joke"));
        assert_eq!(turns[1], ConversationTurn::new(Role::Assistant, "reply 1"));
    }

    #[test]
    fn generative_bounds_window_to_limit() {
        let (mut responder, seen) = generative(false);
        for i in 0..8 {
            responder.respond(&format!("question {}", i));
        }
        let windows = seen.borrow();
        let last = windows.last().unwrap();
        assert_eq!(last.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(last.last().unwrap().content, "question 7");
        assert_eq!(responder.history().len(), 16);
    }

    #[test]
    fn generative_failure_keeps_user_turn() {
        let (mut responder, _) = generative(true);
        assert_eq!(responder.respond("hmm"), CHAT_FAILURE_REPLY);
        let turns = responder.history().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
    }
}
