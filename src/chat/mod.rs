// src/chat/mod.rs
//! Conversational command surface.
//!
//! The transport (Telegram, terminal, tests) stays outside this crate: the
//! engine consumes plain text messages and inline-button callback data and
//! produces [`Reply`] values. Whatever drives it is responsible only for
//! displaying text and buttons and echoing callback data back.

pub mod engine;

pub use engine::ChatEngine;

/// One inline button: a label shown to the user and the opaque data the
/// transport echoes back through `handle_callback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn push_row(&mut self, row: Vec<Button>) {
        self.rows.push(row);
    }
}

/// What the engine wants said back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Slash commands understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Clear,
    Keywords,
    Region,
    Salary,
    Experience,
    Search,
}

impl Command {
    /// Parse a leading-slash command, ignoring any trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let command = text.trim().split_whitespace().next()?;
        match command {
            "/start" => Some(Self::Start),
            "/stop" => Some(Self::Stop),
            "/clear" => Some(Self::Clear),
            "/keywords" => Some(Self::Keywords),
            "/region" => Some(Self::Region),
            "/salary" => Some(Self::Salary),
            "/experience" => Some(Self::Experience),
            "/search" => Some(Self::Search),
            _ => None,
        }
    }
}
