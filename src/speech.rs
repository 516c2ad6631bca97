//! Text-to-speech functionality module.

use std::process::Command;

use anyhow::{Context, Result};

/// Something that can read a reply aloud.
pub trait Speaker {
    /// Speaks `text`, blocking until playback ends.
    ///
    /// # Errors
    /// Returns an error for blank text or when synthesis fails.
    fn speak(&self, text: &str) -> Result<()>;
}

/// Speaks through an external program such as macOS `say` or `espeak`.
#[derive(Clone, Debug)]
pub struct CommandSpeaker {
    program: String,
    rate: Option<u32>,
}

impl CommandSpeaker {
    /// Creates a speaker for `program`.
    ///
    /// # Arguments
    /// * `program` - TTS executable, e.g. `say` or `espeak`.
    /// * `rate` - Words per minute, or `None` for the program default.
    pub fn new(program: impl Into<String>, rate: Option<u32>) -> Self {
        Self {
            program: program.into(),
            rate,
        }
    }

    /// Builds the synthesis command for `text`.
    ///
    /// # Details
    /// `say` takes its rate as `-r`, `espeak`-style programs as `-s`; both
    /// are words per minute.
    fn command(&self, text: &str) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(rate) = self.rate {
            let flag = if self.program.ends_with("say") { "-r" } else { "-s" };
            command.arg(flag).arg(rate.to_string());
        }
        command.arg(text);
        command
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot speak empty text");
        }
        let output = self
            .command(text)
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;
        if !output.status.success() {
            anyhow::bail!("{} exited with {}", self.program, output.status);
        }
        Ok(())
    }
}

/// Speaker used with `--mute`; accepts everything and says nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct MutedSpeaker;

impl Speaker for MutedSpeaker {
    fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn say_uses_rate_flag() {
        let speaker = CommandSpeaker::new("say", Some(150));
        let command = speaker.command("Hello test");
        assert_eq!(command.get_program(), "say");
        assert_eq!(args(&command), ["-r", "150", "Hello test"]);
    }

    #[test]
    fn espeak_uses_speed_flag() {
        let speaker = CommandSpeaker::new("espeak", Some(170));
        assert_eq!(args(&speaker.command("hi")), ["-s", "170", "hi"]);
        let plain = CommandSpeaker::new("espeak", None);
        assert_eq!(args(&plain.command("hi")), ["hi"]);
    }

    #[test]
    fn speak_rejects_empty_text() {
        assert!(CommandSpeaker::new("say", None).speak("   ").is_err());
    }

    #[test]
    fn speak_fails_for_missing_program() {
        let speaker = CommandSpeaker::new("definitely-not-a-tts-engine-91b2", None);
        assert!(speaker.speak("failure case").is_err());
    }

    #[test]
    fn muted_speaker_accepts_text() {
        assert!(MutedSpeaker.speak("Hello test").is_ok());
    }
}
