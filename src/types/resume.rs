// src/types/resume.rs
//! Candidate profile records produced by the source clients

use serde::{Deserialize, Serialize};

/// One position/education entry on a candidate profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub position: Option<String>,
    pub duration: Option<String>,
    pub details: Option<String>,
}

/// A candidate profile fetched from one of the job boards.
///
/// `filling_percentage` is the board-provided completeness score and the
/// sole ranking signal. Boards without one report 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub href: String,
    pub salary_expectation: Option<String>,
    pub experience: Vec<ExperienceEntry>,
    pub filling_percentage: u32,
}

