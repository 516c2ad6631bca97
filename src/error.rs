/*
 * @file error.rs
 * @brief Library error types
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

//! Error types shared by the command core and its collaborators.

use thiserror::Error;

/// Failures raised by collaborators behind the command handlers.
///
/// # Details
/// None of these ever reach the caller of [`crate::dispatcher::Dispatcher::dispatch`];
/// handlers render them into spoken replies.
#[derive(Error, Debug)]
pub enum CommanderError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {url}: {reason}")]
    Browser { url: String, reason: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} responded with status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("unexpected response from {0}")]
    MalformedResponse(&'static str),
}

pub type CommanderResult<T> = Result<T, CommanderError>;
