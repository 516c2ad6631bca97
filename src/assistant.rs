/*
 * @file assistant.rs
 * @brief Voice assistant runtime loop
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

//! Voice assistant orchestration module.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::ai::OpenAiChat;
use crate::analytics::InteractionLog;
use crate::commands;
use crate::config::{load_app_config, AppConfig, CONFIG_PATH};
use crate::dispatcher::Dispatcher;
use crate::fallback::{CannedResponder, FallbackResponder, GenerativeResponder};
use crate::handlers::{builtin_registry, Capabilities, FAREWELL};
use crate::speech::{CommandSpeaker, MutedSpeaker, Speaker};
use crate::weather::OpenWeatherMap;

/// Printed when the recognizer heard something it could not transcribe.
const UNINTELLIGIBLE_NOTICE: &str = "Could not understand. Please try again.";

/// Result of one listening attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Utterance {
    /// Transcribed text, not yet normalized.
    Heard(String),
    /// Audio was captured but produced no usable text.
    Unintelligible,
}

/// Supplier of transcribed utterances (a speech recognizer, a terminal, a script).
pub trait UtteranceSource {
    /// Waits for the next utterance.
    ///
    /// # Returns
    /// * `Ok(Some(utterance))` - Something was heard.
    /// * `Ok(None)` - The source is exhausted and the session should end.
    ///
    /// # Errors
    /// Returns an error when the underlying input fails.
    fn next_utterance(&mut self) -> Result<Option<Utterance>>;
}

/// Treats each line of a reader as one transcription; blank lines are
/// unintelligible.
pub struct LineSource<R> {
    reader: R,
}

impl<R: BufRead> LineSource<R> {
    /// Wraps a buffered reader such as a file or an in-memory script.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LineSource<io::StdinLock<'static>> {
    /// Reads utterances typed on standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> UtteranceSource for LineSource<R> {
    fn next_utterance(&mut self) -> Result<Option<Utterance>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("Failed to read utterance")?;
        if read == 0 {
            return Ok(None);
        }
        let text = line.trim();
        if text.is_empty() {
            return Ok(Some(Utterance::Unintelligible));
        }
        Ok(Some(Utterance::Heard(text.to_string())))
    }
}

/// Options collected from the command line.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub once: bool,
    pub mute: bool,
    pub seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

/// Loads configuration, wires collaborators and runs the assistant on stdin.
///
/// # Errors
/// Returns an error if an explicitly requested config file cannot be loaded,
/// a collaborator cannot be built, stdin fails, or the log cannot be saved.
pub fn run_voice_assistant(options: RunOptions) -> Result<()> {
    let mut config = match &options.config_path {
        Some(path) => AppConfig::from_file(path)?,
        None => load_app_config(Path::new(CONFIG_PATH)),
    };
    config.apply_env();
    let dispatcher = build_dispatcher(&config, Capabilities::system(options.seed))?;
    let speaker: Box<dyn Speaker> = if options.mute || !config.speak_responses {
        Box::new(MutedSpeaker)
    } else {
        Box::new(CommandSpeaker::new(config.tts_program.clone(), config.tts_rate))
    };
    let mut commander = VoiceCommander::new(dispatcher, speaker, io::stdout())
        .with_exit_words(config.exit_words.clone());
    let mut source = LineSource::stdin();
    commander.announce()?;
    if options.once {
        commander.process_iteration(&mut source)?;
    } else {
        commander.run_loop(&mut source)?;
    }
    tracing::info!("{}", commander.log().statistics());
    if let Some(path) = &options.log_file {
        commander.log().save(path)?;
        tracing::info!("interaction log saved to {}", path.display());
    }
    Ok(())
}

/// Assembles the dispatcher described by `config`.
///
/// # Details
/// Registers the built-in commands first, then the custom commands from
/// `config.commands_path`. The weather provider is attached only when an API
/// key is configured, and the chat fallback only when enabled with a key.
///
/// # Errors
/// Returns an error if an HTTP client cannot be constructed.
pub fn build_dispatcher(config: &AppConfig, caps: Capabilities) -> Result<Dispatcher> {
    let caps = match &config.weather_api_key {
        Some(key) => {
            let service = OpenWeatherMap::new(config.weather_url.clone(), key.clone())
                .context("Failed to build weather client")?;
            caps.with_weather(Rc::new(service))
        }
        None => caps,
    };
    let custom = commands::load_commands(&config.commands_path);
    let command_list = commands::generate_command_list(&custom);
    let mut registry = builtin_registry(&caps, config, &command_list);
    commands::register_commands(&mut registry, &custom, &caps.random);
    let fallback = build_fallback(config, &caps, &command_list)?;
    Ok(Dispatcher::new(registry, fallback))
}

/// Chooses the responder for unmatched utterances.
///
/// # Details
/// The generative responder is used only when chat is enabled and an API key
/// is present; its preamble is extended with the custom command list.
///
/// # Errors
/// Returns an error if the chat HTTP client cannot be built.
fn build_fallback(
    config: &AppConfig,
    caps: &Capabilities,
    command_list: &str,
) -> Result<Box<dyn FallbackResponder>> {
    let chat = &config.chat;
    let api_key = match &chat.api_key {
        Some(key) if config.chat_available() => key,
        _ => {
            if chat.enabled {
                tracing::warn!("OPENAI_API_KEY not set; using canned fallback responses");
            }
            return Ok(Box::new(CannedResponder::new(Rc::clone(&caps.random))));
        }
    };
    let model = OpenAiChat::new(
        chat.url.clone(),
        api_key.clone(),
        chat.model.clone(),
        chat.temperature,
        chat.max_tokens,
    )
    .context("Failed to build chat client")?;
    let preamble = if command_list.is_empty() {
        chat.preamble.clone()
    } else {
        format!("{}\n{}", chat.preamble, command_list)
    };
    tracing::info!(model = %chat.model, "chat fallback enabled");
    Ok(Box::new(
        GenerativeResponder::new(Box::new(model))
            .with_preamble(preamble)
            .with_history_limit(chat.history_limit),
    ))
}

/// Runtime that owns the dispatcher, the speech output and the session log.
pub struct VoiceCommander<W: Write> {
    dispatcher: Dispatcher,
    speaker: Box<dyn Speaker>,
    out: W,
    exit_words: Vec<String>,
    log: InteractionLog,
}

impl<W: Write> VoiceCommander<W> {
    /// Creates a runtime writing replies to `out`.
    ///
    /// # Arguments
    /// * `dispatcher` - Routes each utterance to a reply.
    /// * `speaker` - Reads replies aloud.
    /// * `out` - Destination for printed replies and notices.
    pub fn new(dispatcher: Dispatcher, speaker: Box<dyn Speaker>, out: W) -> Self {
        Self {
            dispatcher,
            speaker,
            out,
            exit_words: AppConfig::default().exit_words,
            log: InteractionLog::default(),
        }
    }

    /// Replaces the words that end the session.
    pub fn with_exit_words(mut self, exit_words: Vec<String>) -> Self {
        self.exit_words = exit_words;
        self
    }

    /// Mutable access for registering commands at runtime.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Exchanges handled so far.
    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    /// Consumes the runtime and returns its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Prints the ready banner.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    pub fn announce(&mut self) -> Result<()> {
        writeln!(self.out, "Voice Commander ready!")?;
        writeln!(self.out, "Say 'help' to see available commands")?;
        writeln!(self.out, "Say 'stop' or 'bye' to exit")?;
        Ok(())
    }

    /// Runs until an exit word is heard or the source is exhausted.
    ///
    /// # Errors
    /// Bubbles up input and output failures.
    pub fn run_loop(&mut self, source: &mut dyn UtteranceSource) -> Result<()> {
        while self.process_iteration(source)? {}
        tracing::info!("voice commander shut down");
        Ok(())
    }

    /// Executes one listen-dispatch-respond iteration.
    ///
    /// # Returns
    /// * `Ok(true)` to keep looping, `Ok(false)` to exit gracefully.
    ///
    /// # Errors
    /// Bubbles up input and output failures.
    pub fn process_iteration(&mut self, source: &mut dyn UtteranceSource) -> Result<bool> {
        match source.next_utterance()? {
            None => Ok(false),
            Some(Utterance::Unintelligible) => {
                writeln!(self.out, "{}", UNINTELLIGIBLE_NOTICE)?;
                Ok(true)
            }
            Some(Utterance::Heard(text)) => self.handle_user_text(&text),
        }
    }

    /// Dispatches one transcription, reports the reply and checks for exit.
    ///
    /// # Returns
    /// * `Ok(true)` to continue looping, `Ok(false)` after an exit word.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    pub fn handle_user_text(&mut self, user_text: &str) -> Result<bool> {
        let normalized = user_text.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(true);
        }
        let response = self.dispatcher.dispatch(normalized.as_str());
        if let Some(reply) = &response {
            writeln!(self.out, "AI Response: {}", reply)?;
            self.log.record(&normalized, reply);
            self.speak_response(reply);
        }
        if should_quit(&normalized, &self.exit_words) {
            if response.as_deref() != Some(FAREWELL) {
                writeln!(self.out, "{}", FAREWELL)?;
                self.speak_response(FAREWELL);
            }
            return Ok(false);
        }
        Ok(true)
    }

    /// Speaks the response, logging failures.
    fn speak_response(&self, response: &str) {
        if let Err(err) = self.speaker.speak(response) {
            tracing::warn!("TTS error: {:#}", err);
        }
    }
}

/// Determines whether the user has asked to end the session.
///
/// # Details
/// Substring-based, so "please stop now" also exits.
fn should_quit(user_text: &str, exit_words: &[String]) -> bool {
    exit_words
        .iter()
        .any(|word| !word.is_empty() && user_text.contains(word.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FixedChoice;
    use std::cell::RefCell;
    use std::io::Cursor;

    struct RecordingSpeaker(Rc<RefCell<Vec<String>>>);

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str) -> Result<()> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    struct BrokenSpeaker;

    impl Speaker for BrokenSpeaker {
        fn speak(&self, _text: &str) -> Result<()> {
            anyhow::bail!("no audio device")
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            commands_path: dir.path().join("commands.json"),
            ..AppConfig::default()
        }
    }

    fn test_caps() -> Capabilities {
        let mut caps = Capabilities::system(Some(3));
        caps.random = Rc::new(FixedChoice(0));
        caps
    }

    fn commander(speaker: Box<dyn Speaker>) -> (VoiceCommander<Vec<u8>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(&test_config(&dir), test_caps()).unwrap();
        (VoiceCommander::new(dispatcher, speaker, Vec::new()), dir)
    }

    fn script(lines: &str) -> LineSource<Cursor<Vec<u8>>> {
        LineSource::new(Cursor::new(lines.as_bytes().to_vec()))
    }

    #[test]
    fn quit_detection_understands_variants() {
        let words = AppConfig::default().exit_words;
        assert!(should_quit("please quit now", &words));
        assert!(should_quit("stop listening", &words));
        assert!(!should_quit("keep going", &words));
        assert!(!should_quit("anything", &[String::new()]));
    }

    #[test]
    fn line_source_reports_blank_lines_and_eof() {
        let mut source = script("Hello There\n\n");
        assert_eq!(
            source.next_utterance().unwrap(),
            Some(Utterance::Heard("Hello There".to_string()))
        );
        assert_eq!(source.next_utterance().unwrap(), Some(Utterance::Unintelligible));
        assert_eq!(source.next_utterance().unwrap(), None);
    }

    #[test]
    fn loop_lowercases_speaks_and_stops_on_bye() {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let (mut commander, _dir) = commander(Box::new(RecordingSpeaker(Rc::clone(&spoken))));
        let mut source = script("CALCULATE 6 * 7\n\nBye\nhello\n");
        commander.run_loop(&mut source).unwrap();

        assert_eq!(*spoken.borrow(), ["The answer is 42", FAREWELL]);
        let commands: Vec<&str> = commander
            .log()
            .records()
            .iter()
            .map(|record| record.command.as_str())
            .collect();
        assert_eq!(commands, ["calculate 6 * 7", "bye"]);
        let output = String::from_utf8(commander.into_output()).unwrap();
        assert!(output.contains("AI Response: The answer is 42"));
        assert!(output.contains(UNINTELLIGIBLE_NOTICE));
        assert!(!output.contains("Hello!"));
    }

    #[test]
    fn exit_word_without_farewell_adds_one() {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let (mut commander, _dir) = commander(Box::new(RecordingSpeaker(Rc::clone(&spoken))));
        assert!(!commander.handle_user_text("stop").unwrap());
        let spoken = spoken.borrow();
        assert_eq!(spoken.len(), 2);
        assert!(spoken[0].contains("'stop'"));
        assert_eq!(spoken[1], FAREWELL);
    }

    #[test]
    fn single_iteration_handles_one_utterance() {
        let (mut commander, _dir) = commander(Box::new(MutedSpeaker));
        let mut source = script("tell me a joke\nhelp\n");
        assert!(commander.process_iteration(&mut source).unwrap());
        assert_eq!(commander.log().records().len(), 1);
        assert!(commander.log().records()[0].response.contains("programmer"));
    }

    #[test]
    fn speech_failures_do_not_stop_the_loop() {
        let (mut commander, _dir) = commander(Box::new(BrokenSpeaker));
        assert!(commander.handle_user_text("hello").unwrap());
        assert_eq!(commander.log().records()[0].response, "Hello! How can I assist you?");
    }

    #[test]
    fn custom_commands_are_listed_in_help() {
        let (mut commander, _dir) = commander(Box::new(MutedSpeaker));
        commander.handle_user_text("help").unwrap();
        let help = &commander.log().records()[0].response;
        assert!(help.starts_with("Available commands:"));
        assert!(help.contains("- joke: Tell a programming joke"));
    }

    #[test]
    fn runtime_registration_reaches_the_loop() {
        let (mut commander, _dir) = commander(Box::new(MutedSpeaker));
        commander
            .dispatcher_mut()
            .register("lights", |_: &str| "Lights on.".to_string());
        commander.handle_user_text("Turn the LIGHTS on").unwrap();
        assert_eq!(commander.log().records()[0].response, "Lights on.");
    }

    #[test]
    fn enabled_chat_without_key_uses_canned_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.chat.enabled = true;
        let mut dispatcher = build_dispatcher(&config, test_caps()).unwrap();
        let reply = dispatcher.dispatch("asdkfjasldkf").unwrap();
        assert_eq!(reply, CannedResponder::templates("asdkfjasldkf")[0]);
    }

    #[test]
    fn chat_fallback_sends_preamble_with_custom_commands() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("Tell a programming joke".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Machine learning is pattern fitting."}}]}"#)
            .create();
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.chat.enabled = true;
        config.chat.api_key = Some("sk-test".to_string());
        config.chat.url = format!("{}/v1/chat/completions", server.url());
        let mut dispatcher = build_dispatcher(&config, test_caps()).unwrap();
        assert_eq!(
            dispatcher.dispatch("what is machine learning").unwrap(),
            "Machine learning is pattern fitting."
        );
        mock.assert();
    }
}
