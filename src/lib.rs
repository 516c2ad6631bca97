/*
 * @file lib.rs
 * @brief Voice Commander library root
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

//! Voice Commander - a keyword-driven voice assistant core.
//!
//! Transcribed utterances are routed to the first registered command whose
//! keyword occurs in the text; anything unmatched goes to a fallback
//! responder, which can be canned templates or a chat model fed with recent
//! conversation turns.
//!
//! # Example
//! ```no_run
//! use voice_commander::config::AppConfig;
//! use voice_commander::handlers::Capabilities;
//! use voice_commander::assistant::build_dispatcher;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut dispatcher = build_dispatcher(&AppConfig::default(), Capabilities::system(None))?;
//!     println!("{:?}", dispatcher.dispatch("calculate 2 + 2"));
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod analytics;
pub mod assistant;
pub mod calc;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod platform;
pub mod registry;
pub mod speech;
pub mod weather;
