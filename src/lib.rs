//! resume-scout: resume aggregation from Work.ua and Robota.ua behind a
//! conversational search interface.

pub mod aggregate;
pub mod chat;
pub mod config;
pub mod error;
pub mod matching;
pub mod options;
pub mod sources;
pub mod types;

pub use aggregate::aggregate;
pub use chat::ChatEngine;
pub use config::AppConfig;
pub use error::SearchError;
pub use sources::{ResumeSource, RobotaUaClient, WorkUaClient};
pub use types::{ExperienceEntry, Resume, SearchOptions};
