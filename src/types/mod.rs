// src/types/mod.rs
pub mod resume;
pub mod search;

pub use resume::{ExperienceEntry, Resume};
pub use search::{ConversationState, SearchOptions};
