/*
 * @file registry.rs
 * @brief Ordered keyword command registry
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

//! Ordered keyword table consulted by the dispatcher.

/// A command that turns the full utterance into a reply.
pub trait CommandHandler {
    /// Produces the reply for an utterance that matched this command.
    ///
    /// # Arguments
    /// * `text` - The full matched utterance, not just the keyword.
    fn handle(&self, text: &str) -> String;
}

impl<F> CommandHandler for F
where
    F: Fn(&str) -> String,
{
    fn handle(&self, text: &str) -> String {
        self(text)
    }
}

/// One keyword bound to its handler.
pub struct Command {
    pub keyword: String,
    pub handler: Box<dyn CommandHandler>,
}

/// Keyword → handler mapping that remembers registration order.
///
/// # Details
/// Matching is first-wins by position, so order is part of the behavior.
/// Re-registering a keyword swaps its handler but keeps its slot.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `keyword` to `handler`, replacing any handler already bound.
    ///
    /// # Arguments
    /// * `keyword` - Literal substring that triggers the handler.
    /// * `handler` - The command implementation.
    pub fn register(&mut self, keyword: impl Into<String>, handler: impl CommandHandler + 'static) {
        let keyword = keyword.into();
        let handler: Box<dyn CommandHandler> = Box::new(handler);
        match self.commands.iter_mut().find(|cmd| cmd.keyword == keyword) {
            Some(existing) => {
                tracing::debug!(keyword = %keyword, "replacing command handler");
                existing.handler = handler;
            }
            None => {
                tracing::debug!(keyword = %keyword, "registering command");
                self.commands.push(Command { keyword, handler });
            }
        }
    }

    /// Iterates commands in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Iterates keywords in registration order.
    ///
    /// # Returns
    /// * `impl Iterator<Item = &str>` - Keywords, highest priority first.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|cmd| cmd.keyword.as_str())
    }

    /// Checks whether `keyword` is already bound.
    ///
    /// # Arguments
    /// * `keyword` - Exact keyword, compared without normalisation.
    pub fn contains(&self, keyword: &str) -> bool {
        self.commands.iter().any(|cmd| cmd.keyword == keyword)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finds the earliest-registered command whose keyword occurs in `text`.
    pub fn find_match(&self, text: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|cmd| text.contains(cmd.keyword.as_str()))
    }
}
