/*
 * @file analytics.rs
 * @brief Interaction log and statistics
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

//! In-memory log of handled utterances with simple usage statistics.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

/// One handled utterance and the reply it produced.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionRecord {
    pub timestamp: NaiveDateTime,
    pub command: String,
    pub response: String,
}

/// Ordered record of every exchange handled during a session.
#[derive(Clone, Debug, Default)]
pub struct InteractionLog {
    records: Vec<InteractionRecord>,
}

impl InteractionLog {
    /// Records an exchange stamped with the current local time.
    pub fn record(&mut self, command: &str, response: &str) {
        self.record_at(Local::now().naive_local(), command, response);
    }

    /// Records an exchange with an explicit timestamp.
    ///
    /// # Arguments
    /// * `timestamp` - When the utterance was handled.
    /// * `command` - Normalised utterance text.
    /// * `response` - Reply that was produced.
    pub fn record_at(&mut self, timestamp: NaiveDateTime, command: &str, response: &str) {
        self.records.push(InteractionRecord {
            timestamp,
            command: command.to_string(),
            response: response.to_string(),
        });
    }

    /// Recorded exchanges, oldest first.
    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    /// Summarises how many commands were handled and how often each repeats.
    pub fn statistics(&self) -> String {
        if self.records.is_empty() {
            return "No commands logged yet".to_string();
        }
        let total = self.records.len();
        let unique = self
            .records
            .iter()
            .map(|record| record.command.as_str())
            .collect::<HashSet<_>>()
            .len();
        format!(
            "Command Statistics:\n- Total commands: {}\n- Unique commands: {}\n- Average per command: {:.1}",
            total,
            unique,
            total as f64 / unique as f64
        )
    }

    /// Writes one `timestamp | command | response` line per record.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut contents = String::new();
        for record in &self.records {
            contents.push_str(&format!(
                "{} | {} | {}\n",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.command,
                record.response.replace('\n', " ")
            ));
        }
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn empty_log_has_no_statistics() {
        assert_eq!(InteractionLog::default().statistics(), "No commands logged yet");
    }

    #[test]
    fn statistics_count_repeats() {
        let mut log = InteractionLog::default();
        log.record_at(at(9), "what time is it", "The current time is 09:30 AM");
        log.record_at(at(10), "what is the date", "Today is January 02, 2025");
        log.record_at(at(11), "what time is it", "The current time is 11:30 AM");
        assert_eq!(
            log.statistics(),
            "Command Statistics:\n- Total commands: 3\n- Unique commands: 2\n- Average per command: 1.5"
        );
    }

    #[test]
    fn save_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.log");
        let mut log = InteractionLog::default();
        log.record_at(at(9), "help", "Available commands:\n- 'hello'");
        log.record("bye", "Goodbye! Have a great day!");
        log.save(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "2025-01-02 09:30:00 | help | Available commands: - 'hello'");
        assert!(lines[1].ends_with("| bye | Goodbye! Have a great day!"));
    }
}
