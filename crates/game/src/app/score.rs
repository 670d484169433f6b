use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ScoreReportError {
    #[error("score collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Outward, one-way score notifications. Called once per first-time correct
/// answer; the caller never retries.
pub trait ScoreReporter {
    fn report_score_delta(&mut self, points: u32) -> Result<(), ScoreReportError>;
}

/// Logs each delta. Stands in for the hosted team backend.
#[derive(Debug, Default)]
pub struct TracingScoreReporter {
    reported_total: u64,
}

impl TracingScoreReporter {
    pub fn reported_total(&self) -> u64 {
        self.reported_total
    }
}

impl ScoreReporter for TracingScoreReporter {
    fn report_score_delta(&mut self, points: u32) -> Result<(), ScoreReportError> {
        self.reported_total = self.reported_total.saturating_add(u64::from(points));
        info!(
            points,
            reported_total = self.reported_total,
            "score_delta_reported"
        );
        Ok(())
    }
}
