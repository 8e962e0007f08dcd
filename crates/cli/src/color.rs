// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;
use wsh_core::{CommandState, JobState};

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Secondary text: darker grey
    pub const MUTED: u8 = 240;
    pub const GOOD: u8 = 108;
    pub const BAD: u8 = 167;
    /// Still running
    pub const PENDING: u8 = 179;
}

const RESET: &str = "\x1b[0m";

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    decide(
        std::env::var("NO_COLOR").is_ok_and(|v| v == "1"),
        std::env::var("COLOR").is_ok_and(|v| v == "1"),
        std::io::stdout().is_terminal(),
    )
}

fn decide(no_color: bool, force: bool, tty: bool) -> bool {
    !no_color && (force || tty)
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn paint(code: u8, text: &str, enabled: bool) -> String {
    if enabled {
        format!("\x1b[38;5;{code}m{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text, should_colorize())
}

pub fn literal(text: &str) -> String {
    paint(codes::LITERAL, text, should_colorize())
}

pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text, should_colorize())
}

fn command_state_code(state: CommandState) -> u8 {
    match state {
        CommandState::Doing => codes::PENDING,
        CommandState::Success => codes::GOOD,
        _ => codes::BAD,
    }
}

fn job_state_code(state: JobState) -> u8 {
    match state {
        JobState::Doing => codes::PENDING,
        JobState::Done => codes::GOOD,
        JobState::Failed => codes::BAD,
    }
}

/// Command state label, colored by outcome
pub fn command_state(state: CommandState) -> String {
    paint(command_state_code(state), &state.to_string(), should_colorize())
}

pub fn job_state(state: JobState) -> String {
    paint(job_state_code(state), &state.to_string(), should_colorize())
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
