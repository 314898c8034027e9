// src/sources/mod.rs
//! Job-board integrations.
//!
//! Each board implements [`ResumeSource`]; the aggregation and chat layers
//! only ever see the trait, never a concrete client.

pub mod robota_ua;
pub mod work_ua;

pub use robota_ua::RobotaUaClient;
pub use work_ua::WorkUaClient;

use crate::error::SearchError;
use crate::types::{Resume, SearchOptions};

/// A read-only resume search capability over one job board.
pub trait ResumeSource {
    fn name(&self) -> &'static str;

    /// Translate the abstract criteria into this board's vocabulary and
    /// fetch every matching resume.
    fn search_resumes(
        &self,
        options: &SearchOptions,
    ) -> impl std::future::Future<Output = Result<Vec<Resume>, SearchError>> + Send;
}
