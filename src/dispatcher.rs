/*
 * @file dispatcher.rs
 * @brief Utterance dispatch to commands and fallback
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

//! Routes an utterance to the first matching command or to the fallback.

use std::collections::BTreeMap;

use crate::fallback::FallbackResponder;
use crate::registry::{CommandHandler, CommandRegistry};

/// Owns the command table and the fallback responder.
///
/// # Details
/// Matching is first-wins by registration order: when several keywords occur
/// in the same utterance, the one registered earliest handles it even if a
/// later one fits better.
pub struct Dispatcher {
    registry: CommandRegistry,
    fallback: Box<dyn FallbackResponder>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    ///
    /// # Arguments
    /// * `registry` - Commands in matching order.
    /// * `fallback` - Responder for utterances that match no keyword.
    pub fn new(registry: CommandRegistry, fallback: Box<dyn FallbackResponder>) -> Self {
        Self { registry, fallback }
    }

    /// Adds or replaces a command; see [`CommandRegistry::register`].
    pub fn register(&mut self, keyword: impl Into<String>, handler: impl CommandHandler + 'static) {
        let keyword = keyword.into();
        tracing::info!("Custom command '{}' added", keyword);
        self.registry.register(keyword, handler);
    }

    /// Read-only view of the command table.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Keyword that would handle `text`, if any.
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        self.registry.find_match(text).map(|cmd| cmd.keyword.as_str())
    }

    /// Produces the reply for one utterance.
    ///
    /// # Arguments
    /// * `text` - Lower-cased transcription; `None` or blank means nothing was heard.
    ///
    /// # Returns
    /// * `Some(String)` - The matched handler's reply, or the fallback's.
    /// * `None` - The input was absent or blank.
    pub fn dispatch<'a>(&mut self, text: impl Into<Option<&'a str>>) -> Option<String> {
        let text = text.into().filter(|text| !text.trim().is_empty())?;
        match self.registry.find_match(text) {
            Some(cmd) => {
                tracing::debug!(keyword = %cmd.keyword, "dispatching command");
                Some(cmd.handler.handle(text))
            }
            None => {
                tracing::debug!("no command matched, using fallback");
                Some(self.fallback.respond(text))
            }
        }
    }

    /// Dispatches `text` annotated with caller context, rendered as
    /// `"{text} (context: {key: value, ...})"`.
    ///
    /// # Details
    /// The annotation takes part in keyword matching like any other text.
    pub fn dispatch_with_context(
        &mut self,
        text: &str,
        context: &BTreeMap<String, String>,
    ) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        let rendered: Vec<String> = context
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        let enhanced = format!("{} (context: {{{}}})", text, rendered.join(", "));
        self.dispatch(enhanced.as_str())
    }

    /// Fraction of the keyword's words that occur in `text`.
    ///
    /// # Returns
    /// * `f32` - Between 0.0 and 1.0; 0.0 for a keyword with no words.
    pub fn command_confidence(text: &str, keyword: &str) -> f32 {
        let words: Vec<&str> = keyword.split_whitespace().collect();
        if words.is_empty() {
            return 0.0;
        }
        let matches = words.iter().filter(|word| text.contains(*word)).count();
        matches as f32 / words.len() as f32
    }
}
