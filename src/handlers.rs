/*
 * @file handlers.rs
 * @brief Built-in command handlers
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

//! Built-in command handlers and the default command table.

use std::rc::Rc;

use crate::calc::{format_number, ArithmeticEvaluator, Evaluator};
use crate::config::{AppConfig, Application};
use crate::platform::{
    pick, BrowserLauncher, Clock, ProcessLauncher, RandomChoice, SeededChoice, SystemBrowser,
    SystemClock, SystemLauncher,
};
use crate::registry::{CommandHandler, CommandRegistry};
use crate::weather::{WeatherLookup, WeatherService};

/// Farewell returned by the `bye` command.
pub const FAREWELL: &str = "Goodbye! Have a great day!";

/// Reply for a failed calculation of any kind.
pub const CALCULATION_FAILED: &str = "Could not calculate that expression";

/// Reply when the weather command has no provider configured.
pub const WEATHER_UNCONFIGURED: &str =
    "Weather feature requires API key. Please configure with OpenWeatherMap API.";

const GREETINGS: [&str; 3] = [
    "Hello! How can I assist you?",
    "Hi there! What can I do for you?",
    "Hey! Ready to help. What do you need?",
];

const HELP_TEXT: &str = "Available commands:
- 'what time is it?' - Get current time
- 'what is the date?' - Get current date
- 'weather in [city]' - Get current weather
- 'open [app name]' - Open applications (notepad, calculator, chrome, etc.)
- 'search for [query]' - Search on Google
- 'calculate [expression]' - Simple math calculation
- 'hello' - Get a greeting
- 'help' - Show this help message
- 'bye' - Exit the program";

/// Collaborators shared by the built-in handlers.
#[derive(Clone)]
pub struct Capabilities {
    pub clock: Rc<dyn Clock>,
    pub launcher: Rc<dyn ProcessLauncher>,
    pub browser: Rc<dyn BrowserLauncher>,
    pub random: Rc<dyn RandomChoice>,
    pub evaluator: Rc<dyn Evaluator>,
    pub weather: Option<Rc<dyn WeatherService>>,
}

impl Capabilities {
    /// System-backed capabilities; `seed` makes random choices replayable.
    pub fn system(seed: Option<u64>) -> Self {
        let random = match seed {
            Some(seed) => SeededChoice::from_seed(seed),
            None => SeededChoice::from_entropy(),
        };
        Self {
            clock: Rc::new(SystemClock),
            launcher: Rc::new(SystemLauncher),
            browser: Rc::new(SystemBrowser),
            random: Rc::new(random),
            evaluator: Rc::new(ArithmeticEvaluator),
            weather: None,
        }
    }

    /// Attaches a weather provider.
    pub fn with_weather(mut self, weather: Rc<dyn WeatherService>) -> Self {
        self.weather = Some(weather);
        self
    }
}

/// Builds the default command table in its matching order:
/// `time, date, weather, open, search, calculate, hello, help, bye`.
///
/// # Arguments
/// * `caps` - Collaborators handed to each handler.
/// * `config` - Application table, search URL and default city.
/// * `help_extra` - Extra help lines appended after the built-ins (may be empty).
pub fn builtin_registry(
    caps: &Capabilities,
    config: &AppConfig,
    help_extra: &str,
) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register("time", TimeHandler::new(Rc::clone(&caps.clock)));
    registry.register("date", DateHandler::new(Rc::clone(&caps.clock)));
    registry.register(
        "weather",
        WeatherHandler::new(caps.weather.clone(), config.default_city.clone()),
    );
    registry.register(
        "open",
        OpenAppHandler::new(config.applications.clone(), Rc::clone(&caps.launcher)),
    );
    registry.register(
        "search",
        SearchHandler::new(config.search_url.clone(), Rc::clone(&caps.browser)),
    );
    registry.register("calculate", CalculateHandler::new(Rc::clone(&caps.evaluator)));
    registry.register("hello", GreetHandler::new(Rc::clone(&caps.random)));
    registry.register("help", HelpHandler::new(help_extra));
    registry.register("bye", GoodbyeHandler);
    registry
}

/// Reports the wall-clock time, e.g. `The current time is 02:07 PM`.
pub struct TimeHandler {
    clock: Rc<dyn Clock>,
}

impl TimeHandler {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl CommandHandler for TimeHandler {
    fn handle(&self, _text: &str) -> String {
        format!("The current time is {}", self.clock.now().format("%I:%M %p"))
    }
}

/// Reports the date, e.g. `Today is March 05, 2024`.
pub struct DateHandler {
    clock: Rc<dyn Clock>,
}

impl DateHandler {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl CommandHandler for DateHandler {
    fn handle(&self, _text: &str) -> String {
        format!("Today is {}", self.clock.now().format("%B %d, %Y"))
    }
}

/// Looks up current conditions for the city named after `in`.
pub struct WeatherHandler {
    service: Option<Rc<dyn WeatherService>>,
    default_city: String,
}

impl WeatherHandler {
    /// Creates the handler.
    ///
    /// # Arguments
    /// * `service` - Provider, or `None` when no API key is configured.
    /// * `default_city` - City used when the utterance names none.
    pub fn new(service: Option<Rc<dyn WeatherService>>, default_city: String) -> Self {
        Self {
            service,
            default_city,
        }
    }

    /// Extracts the city from `"... weather in <city>"`, or the default.
    fn city<'a>(&'a self, text: &'a str) -> &'a str {
        text.rsplit_once(" in ")
            .map(|(_, city)| trim_punctuation(city))
            .filter(|city| !city.is_empty())
            .unwrap_or(self.default_city.as_str())
    }
}

impl CommandHandler for WeatherHandler {
    fn handle(&self, text: &str) -> String {
        let Some(service) = &self.service else {
            return WEATHER_UNCONFIGURED.to_string();
        };
        let city = self.city(text);
        match service.current(city) {
            Ok(WeatherLookup::Found(report)) => report.summary(),
            Ok(WeatherLookup::UnknownCity) => format!("City '{}' not found", city),
            Err(err) => {
                tracing::warn!("Weather API error: {}", err);
                "Error fetching weather information".to_string()
            }
        }
    }
}

/// Launches the first known application named in the utterance.
pub struct OpenAppHandler {
    applications: Vec<Application>,
    launcher: Rc<dyn ProcessLauncher>,
}

impl OpenAppHandler {
    pub fn new(applications: Vec<Application>, launcher: Rc<dyn ProcessLauncher>) -> Self {
        Self {
            applications,
            launcher,
        }
    }
}

impl CommandHandler for OpenAppHandler {
    fn handle(&self, text: &str) -> String {
        let Some(app) = self
            .applications
            .iter()
            .find(|app| text.contains(app.name.as_str()))
        else {
            return "Application not found in database".to_string();
        };
        match self.launcher.launch(&app.program) {
            Ok(()) => {
                tracing::info!(app = %app.name, program = %app.program, "launched application");
                format!("Opening {}", app.name)
            }
            Err(err) => {
                tracing::warn!("{}", err);
                format!("Could not open {}: {}", app.name, err)
            }
        }
    }
}

/// Opens a web search for the utterance minus `search` / `for`.
pub struct SearchHandler {
    search_url: String,
    browser: Rc<dyn BrowserLauncher>,
}

impl SearchHandler {
    pub fn new(search_url: String, browser: Rc<dyn BrowserLauncher>) -> Self {
        Self { search_url, browser }
    }
}

impl CommandHandler for SearchHandler {
    fn handle(&self, text: &str) -> String {
        let query = strip_phrases(text, &["search", "for"]);
        if query.is_empty() {
            return "What would you like to search for?".to_string();
        }
        let url = format!("{}{}", self.search_url, query);
        match self.browser.open_url(&url) {
            Ok(()) => format!("Searching for {}", query),
            Err(err) => {
                tracing::warn!("{}", err);
                format!("Could not perform search: {}", err)
            }
        }
    }
}

/// Evaluates the arithmetic left after removing `calculate` / `what is`.
pub struct CalculateHandler {
    evaluator: Rc<dyn Evaluator>,
}

impl CalculateHandler {
    pub fn new(evaluator: Rc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }
}

impl CommandHandler for CalculateHandler {
    fn handle(&self, text: &str) -> String {
        let stripped = strip_phrases(text, &["calculate", "what is"]);
        let expression = trim_punctuation(&stripped);
        match self.evaluator.evaluate(expression) {
            Ok(value) => format!("The answer is {}", format_number(value)),
            Err(err) => {
                tracing::debug!(expression, "calculation failed: {}", err);
                CALCULATION_FAILED.to_string()
            }
        }
    }
}

/// Returns one of three canned greetings.
pub struct GreetHandler {
    random: Rc<dyn RandomChoice>,
}

impl GreetHandler {
    pub fn new(random: Rc<dyn RandomChoice>) -> Self {
        Self { random }
    }

    /// Every greeting the handler can produce.
    pub fn greetings() -> &'static [&'static str] {
        &GREETINGS
    }
}

impl CommandHandler for GreetHandler {
    fn handle(&self, _text: &str) -> String {
        pick(self.random.as_ref(), &GREETINGS).to_string()
    }
}

/// Static help listing, optionally followed by custom command lines.
pub struct HelpHandler {
    text: String,
}

impl HelpHandler {
    /// Builds the help text.
    ///
    /// # Arguments
    /// * `extra` - Lines appended after the built-ins, such as the custom command list.
    pub fn new(extra: &str) -> Self {
        let text = if extra.trim().is_empty() {
            HELP_TEXT.to_string()
        } else {
            format!("{}\n{}", HELP_TEXT, extra.trim_end())
        };
        Self { text }
    }
}

impl CommandHandler for HelpHandler {
    fn handle(&self, _text: &str) -> String {
        self.text.clone()
    }
}

/// Says goodbye. Ending the session is up to the caller.
pub struct GoodbyeHandler;

impl CommandHandler for GoodbyeHandler {
    fn handle(&self, _text: &str) -> String {
        FAREWELL.to_string()
    }
}

/// Removes whole-word occurrences of each phrase and collapses whitespace.
///
/// # Details
/// Phrases may span several words (`"what is"`) and are matched against the
/// whitespace-separated words of `text`, so `"for"` is dropped but `"format"`
/// is kept.
pub fn strip_phrases(text: &str, phrases: &[&str]) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let patterns: Vec<Vec<&str>> = phrases
        .iter()
        .map(|phrase| phrase.split_whitespace().collect::<Vec<_>>())
        .filter(|pattern| !pattern.is_empty())
        .collect();
    let mut kept = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        match patterns
            .iter()
            .find(|pattern| words[i..].starts_with(pattern.as_slice()))
        {
            Some(pattern) => i += pattern.len(),
            None => {
                kept.push(words[i]);
                i += 1;
            }
        }
    }
    kept.join(" ")
}

/// Trims whitespace and trailing `?`, `.` and `!`.
fn trim_punctuation(text: &str) -> &str {
    text.trim()
        .trim_end_matches(|c| matches!(c, '?' | '.' | '!'))
        .trim_end()
}
