//! JSON answer map sink

use crate::output::traits::{OutputResult, ReportSink, RunReport};
use std::path::PathBuf;

/// Writes `{questionId: answerText}` as pretty-printed JSON
///
/// Unanswered questions are left out of the map.
pub struct JsonAnswerSink {
    path: PathBuf,
}

impl JsonAnswerSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonAnswerSink {
    fn submit(&self, report: &RunReport) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&report.answer_map())?;
        std::fs::write(&self.path, json)?;

        tracing::info!("Wrote {} answers to {}", report.answers.len(), self.path.display());
        Ok(())
    }
}
