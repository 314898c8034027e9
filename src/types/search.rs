// src/types/search.rs
use serde::{Deserialize, Serialize};

/// Source-agnostic search criteria collected through the conversation.
///
/// Each source client translates this into its own query vocabulary; the
/// struct itself never carries source-specific IDs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    pub search: String,
    pub region: Option<String>,
    pub salary_from: Option<u32>,
    pub salary_to: Option<u32>,
    pub experience: Vec<String>,
}

impl SearchOptions {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Which question the conversation is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Free,
    AskingKeywords,
    AskingRegion,
    AskingSalaryFrom,
    AskingSalaryTo,
    AskingExperience,
}
