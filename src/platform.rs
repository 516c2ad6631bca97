/*
 * @file platform.rs
 * @brief Host platform capabilities
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

//! Ambient capabilities the command handlers depend on.
//!
//! Each capability is a narrow trait with a system-backed implementation,
//! so handlers can be exercised with fixed clocks, scripted launchers and
//! deterministic choices.

use std::cell::RefCell;
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CommanderError, CommanderResult};

/// Source of the current local date and time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Starts an external application by program name.
pub trait ProcessLauncher {
    /// Spawns `program` without waiting for it to exit.
    ///
    /// # Errors
    /// Returns [`CommanderError::Launch`] when the process cannot be spawned.
    fn launch(&self, program: &str) -> CommanderResult<()>;
}

/// Launcher that spawns detached child processes with null stdio.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, program: &str) -> CommanderResult<()> {
        spawn_reaped(&mut Command::new(program))
            .map(|_| ())
            .map_err(|source| CommanderError::Launch {
                program: program.to_string(),
                source,
            })
    }
}

/// Opens a URL in the user's browser.
pub trait BrowserLauncher {
    /// # Errors
    /// Returns [`CommanderError::Browser`] when no opener could be started.
    fn open_url(&self, url: &str) -> CommanderResult<()>;
}

/// Browser launcher that hands the URL to the platform opener.
///
/// # Details
/// Uses `open` on macOS, `cmd /C start` on Windows and `xdg-open` elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open_url(&self, url: &str) -> CommanderResult<()> {
        spawn_reaped(opener_command().arg(url))
            .map(|_| ())
            .map_err(|err| CommanderError::Browser {
                url: url.to_string(),
                reason: err.to_string(),
            })
    }
}

/// Spawns `command` with null stdio and waits for it on a background thread.
///
/// # Details
/// The caller does not block on the child, but the exit status is still
/// collected so finished programs do not linger as zombies.
///
/// # Returns
/// * `JoinHandle` - Yields the child's exit status; dropping it detaches the waiter.
///
/// # Errors
/// Returns the spawn error when the program cannot be started.
fn spawn_reaped(command: &mut Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || child.wait()))
}

/// Platform opener that accepts a URL as its last argument.
fn opener_command() -> Command {
    if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    }
}

/// Uniform choice of an index in `0..len`.
pub trait RandomChoice {
    /// Returns an index below `len`; `len` is always at least one.
    fn choose(&self, len: usize) -> usize;
}

/// Random choice backed by a [`StdRng`], optionally seeded for replay.
#[derive(Debug)]
pub struct SeededChoice {
    rng: RefCell<StdRng>,
}

impl SeededChoice {
    /// Creates a generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a generator that replays the same sequence for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomChoice for SeededChoice {
    fn choose(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.borrow_mut().random_range(0..len)
    }
}

/// Always picks the same index, clamped to the available range.
#[derive(Clone, Copy, Debug)]
pub struct FixedChoice(pub usize);

impl RandomChoice for FixedChoice {
    fn choose(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Picks one entry of `options` through `random`.
pub fn pick<'a>(random: &dyn RandomChoice, options: &[&'a str]) -> &'a str {
    options
        .get(random.choose(options.len()))
        .copied()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_choice_replays_sequence() {
        let first = SeededChoice::from_seed(7);
        let second = SeededChoice::from_seed(7);
        let a: Vec<usize> = (0..16).map(|_| first.choose(3)).collect();
        let b: Vec<usize> = (0..16).map(|_| second.choose(3)).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|&idx| idx < 3));
    }

    #[test]
    fn fixed_choice_clamps_to_range() {
        assert_eq!(FixedChoice(5).choose(3), 2);
        assert_eq!(FixedChoice(1).choose(3), 1);
        assert_eq!(FixedChoice(0).choose(0), 0);
    }

    #[test]
    fn pick_returns_selected_option() {
        assert_eq!(pick(&FixedChoice(1), &["a", "b", "c"]), "b");
        assert_eq!(pick(&FixedChoice(0), &[]), "");
    }

    #[cfg(unix)]
    #[test]
    fn spawned_children_are_waited_on() {
        let waiter = spawn_reaped(&mut Command::new("true")).unwrap();
        let status = waiter.join().unwrap().unwrap();
        assert!(status.success());
        assert!(SystemLauncher.launch("true").is_ok());
    }

    #[test]
    fn system_launcher_reports_missing_program() {
        let err = SystemLauncher
            .launch("definitely-not-a-real-program-4f1c")
            .unwrap_err();
        assert!(matches!(err, CommanderError::Launch { .. }));
    }
}
