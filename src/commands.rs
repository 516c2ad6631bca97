/*
 * @file commands.rs
 * @brief Custom command loading and registration
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

//! User-defined reply commands loaded from `commands.json`.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::platform::RandomChoice;
use crate::registry::{CommandHandler, CommandRegistry};

/// Represents a single custom command configuration.
///
/// # Details
/// Maps natural language keywords to one or more canned replies; one reply
/// is chosen at random each time the command fires.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CommandConfig {
    /// Keywords that trigger this command.
    pub keywords: Vec<String>,
    /// Candidate replies.
    pub responses: Vec<String>,
    /// Human-readable description of what the command does.
    pub description: String,
}

/// Container for all configured custom commands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CommandsConfig {
    pub commands: Vec<CommandConfig>,
}

/// Loads custom commands from `path`.
///
/// # Details
/// A missing file yields [`default_commands`]; a file that cannot be read or
/// parsed is logged and yields an empty set, so a broken file never
/// silently resurrects the defaults.
///
/// # Arguments
/// * `path` - Location of the JSON command file.
///
/// # Returns
/// * `CommandsConfig` - Loaded, default, or empty command configuration.
pub fn load_commands(path: &Path) -> CommandsConfig {
    if !path.exists() {
        tracing::debug!("{} not found, using default commands", path.display());
        return default_commands();
    }
    load_commands_from_file(path).unwrap_or_else(|err| {
        tracing::warn!("Failed to load custom commands: {:#}", err);
        CommandsConfig::default()
    })
}

/// Reads and parses a command file.
///
/// # Errors
/// Returns an error if the file cannot be read or contains invalid JSON.
pub fn load_commands_from_file(path: &Path) -> Result<CommandsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Default commands used when no command file exists.
pub fn default_commands() -> CommandsConfig {
    CommandsConfig {
        commands: vec![CommandConfig {
            keywords: vec!["joke".to_string()],
            responses: vec![
                "Why did the programmer quit his job? Because he didn't get arrays!".to_string(),
                "Why do programmers prefer dark mode? Because light attracts bugs!".to_string(),
                "How many programmers does it take to change a light bulb? None, that's a hardware problem!"
                    .to_string(),
            ],
            description: "Tell a programming joke".to_string(),
        }],
    }
}

/// Handler that answers with one of a fixed set of replies.
pub struct StaticReply {
    responses: Rc<[String]>,
    random: Rc<dyn RandomChoice>,
}

impl StaticReply {
    /// Creates the handler.
    ///
    /// # Arguments
    /// * `responses` - Candidate replies shared across the command's keywords.
    /// * `random` - Picks one reply per invocation.
    pub fn new(responses: Rc<[String]>, random: Rc<dyn RandomChoice>) -> Self {
        Self { responses, random }
    }
}

impl CommandHandler for StaticReply {
    fn handle(&self, _text: &str) -> String {
        if self.responses.is_empty() {
            return String::new();
        }
        let index = self.random.choose(self.responses.len());
        self.responses[index.min(self.responses.len() - 1)].clone()
    }
}

/// Registers every keyword of every custom command, in file order.
///
/// # Details
/// Commands without replies are skipped. A keyword that is already
/// registered has its handler replaced in place.
pub fn register_commands(
    registry: &mut CommandRegistry,
    commands: &CommandsConfig,
    random: &Rc<dyn RandomChoice>,
) {
    for cmd in &commands.commands {
        if cmd.responses.is_empty() {
            tracing::warn!("Skipping custom command '{}' with no responses", cmd.description);
            continue;
        }
        let responses: Rc<[String]> = cmd.responses.clone().into();
        for keyword in cmd.keywords.iter().map(|k| k.trim().to_lowercase()) {
            if keyword.is_empty() {
                continue;
            }
            if registry.contains(&keyword) {
                tracing::warn!("Custom command '{}' replaces an existing handler", keyword);
            }
            registry.register(
                keyword,
                StaticReply::new(Rc::clone(&responses), Rc::clone(random)),
            );
        }
    }
}

/// Renders custom commands as help lines.
///
/// # Returns
/// * `String` - `"Custom commands:"` followed by one `- keywords: description`
///   line per command, or an empty string when there are none.
pub fn generate_command_list(commands: &CommandsConfig) -> String {
    if commands.commands.is_empty() {
        return String::new();
    }
    let mut result = String::from("Custom commands:\n");
    for cmd in &commands.commands {
        result.push_str(&format!("- {}: {}\n", cmd.keywords.join(", "), cmd.description));
    }
    result
}
