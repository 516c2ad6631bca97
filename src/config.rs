/*
 * @file config.rs
 * @brief Application configuration
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

//! Runtime configuration loaded from `config.json` and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ai::DEFAULT_HISTORY_LIMIT;
use crate::weather::OPENWEATHER_URL;

/// Path to the JSON configuration file that holds runtime defaults.
pub const CONFIG_PATH: &str = "config.json";

/// Known application the `open` command can launch.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Application {
    /// Spoken name matched against the utterance.
    pub name: String,
    /// Program handed to the process launcher.
    pub program: String,
}

impl Application {
    fn new(name: &str, program: &str) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
        }
    }
}

/// Settings for the context-aware chat fallback.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub preamble: String,
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 150,
            preamble: "You are a helpful voice assistant. Keep replies short and conversational."
                .to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Strongly typed representation of `config.json`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "fallback_speak_responses")]
    pub speak_responses: bool,
    #[serde(default = "fallback_tts_program")]
    pub tts_program: String,
    #[serde(default = "fallback_tts_rate")]
    pub tts_rate: Option<u32>,
    #[serde(default = "fallback_applications")]
    pub applications: Vec<Application>,
    #[serde(default = "fallback_search_url")]
    pub search_url: String,
    #[serde(default = "fallback_default_city")]
    pub default_city: String,
    #[serde(default = "fallback_weather_url")]
    pub weather_url: String,
    #[serde(default)]
    pub weather_api_key: Option<String>,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default = "fallback_exit_words")]
    pub exit_words: Vec<String>,
    #[serde(default = "fallback_commands_path")]
    pub commands_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            speak_responses: fallback_speak_responses(),
            tts_program: fallback_tts_program(),
            tts_rate: fallback_tts_rate(),
            applications: fallback_applications(),
            search_url: fallback_search_url(),
            default_city: fallback_default_city(),
            weather_url: fallback_weather_url(),
            weather_api_key: None,
            chat: ChatConfig::default(),
            exit_words: fallback_exit_words(),
            commands_path: fallback_commands_path(),
        }
    }
}

impl AppConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    ///
    /// # Details
    /// Recognised keys: `OPENWEATHER_API_KEY`, `OPENAI_API_KEY`,
    /// `VOICE_COMMANDER_MODEL`, `VOICE_COMMANDER_CHAT_URL` and
    /// `VOICE_COMMANDER_TTS`. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(key) = get("OPENWEATHER_API_KEY") {
            self.weather_api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.chat.api_key = Some(key);
        }
        if let Some(model) = get("VOICE_COMMANDER_MODEL") {
            self.chat.model = model;
        }
        if let Some(url) = get("VOICE_COMMANDER_CHAT_URL") {
            self.chat.url = url;
        }
        if let Some(program) = get("VOICE_COMMANDER_TTS") {
            self.tts_program = program;
        }
    }

    /// Whether the chat fallback is both enabled and has credentials.
    pub fn chat_available(&self) -> bool {
        self.chat.enabled && self.chat.api_key.is_some()
    }
}

/// Loads configuration from `path`, falling back to baked defaults when missing.
///
/// # Details
/// A missing or invalid file is logged and replaced by [`AppConfig::default`],
/// so the assistant always starts.
pub fn load_app_config(path: &Path) -> AppConfig {
    match AppConfig::from_file(path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Config load error: {:#}. Using defaults.", err);
            AppConfig::default()
        }
    }
}

fn fallback_speak_responses() -> bool {
    true
}

/// `say` on macOS, `espeak` elsewhere.
fn fallback_tts_program() -> String {
    if cfg!(target_os = "macos") {
        "say".to_string()
    } else {
        "espeak".to_string()
    }
}

fn fallback_tts_rate() -> Option<u32> {
    Some(150)
}

/// Default application table.
///
/// # Details
/// Order matters: the first name found in the utterance is launched.
fn fallback_applications() -> Vec<Application> {
    vec![
        Application::new("notepad", "notepad"),
        Application::new("calculator", "calc"),
        Application::new("chrome", "chrome"),
        Application::new("firefox", "firefox"),
        Application::new("vs code", "code"),
        Application::new("spotify", "spotify"),
        Application::new("word", "winword"),
        Application::new("excel", "excel"),
        Application::new("powerpoint", "powerpnt"),
    ]
}

fn fallback_search_url() -> String {
    "https://www.google.com/search?q=".to_string()
}

fn fallback_default_city() -> String {
    "London".to_string()
}

fn fallback_weather_url() -> String {
    OPENWEATHER_URL.to_string()
}

fn fallback_exit_words() -> Vec<String> {
    ["stop", "exit", "quit", "bye", "goodbye"]
        .iter()
        .map(|word| word.to_string())
        .collect()
}

fn fallback_commands_path() -> PathBuf {
    PathBuf::from("commands.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn empty_object_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.applications[0].name, "notepad");
        assert_eq!(config.chat.history_limit, 10);
    }

    #[test]
    fn partial_file_overrides_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"speak_responses": false, "applications": [{{"name": "terminal", "program": "xterm"}}],
               "chat": {{"enabled": true, "model": "llama3.2:3b"}}}}"#
        )
        .unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(!config.speak_responses);
        assert_eq!(config.applications, vec![Application::new("terminal", "xterm")]);
        assert!(config.chat.enabled);
        assert_eq!(config.chat.model, "llama3.2:3b");
        assert_eq!(config.chat.max_tokens, 150);
        assert_eq!(config.default_city, "London");
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(&dir.path().join("absent.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
        assert_eq!(load_app_config(file.path()), AppConfig::default());
    }

    #[test]
    fn overrides_apply_and_ignore_blank_values() {
        let env: HashMap<&str, &str> = [
            ("OPENWEATHER_API_KEY", "owm"),
            ("OPENAI_API_KEY", "sk-test"),
            ("VOICE_COMMANDER_MODEL", "  "),
            ("VOICE_COMMANDER_TTS", "espeak-ng"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.weather_api_key.as_deref(), Some("owm"));
        assert_eq!(config.chat.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chat.model, "gpt-3.5-turbo");
        assert_eq!(config.tts_program, "espeak-ng");
        assert!(!config.chat_available());
        config.chat.enabled = true;
        assert!(config.chat_available());
    }
}
