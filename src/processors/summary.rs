use crate::fetcher::DownloadReport;
use crate::models::DownloadOutcome;

/// A permanently abandoned fetch unit, carried into the final report.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub unit_label: String,
    pub attempts: u32,
    pub reason: String,
}

/// Per-(variable, location) processing outcome.
#[derive(Debug, Clone)]
pub struct PairSummary {
    pub variable: String,
    pub location: String,
    pub observations: usize,
    pub days: usize,
    pub weeks: usize,
    pub gap_count: usize,
    pub files_used: usize,
    pub files_skipped: usize,
}

/// Final run report: what was produced, what is missing and why. The run
/// itself always completes; this is where partial coverage surfaces.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub pairs: Vec<PairSummary>,
    pub permanent_failures: Vec<UnitFailure>,
}

impl RunSummary {
    pub fn new(pairs: Vec<PairSummary>, permanent_failures: Vec<UnitFailure>) -> Self {
        Self {
            pairs,
            permanent_failures,
        }
    }

    pub fn failures_from_report(report: &DownloadReport) -> Vec<UnitFailure> {
        report
            .permanent_failures()
            .map(|result| {
                let reason = match &result.outcome {
                    DownloadOutcome::PermanentFailure(reason) => reason.clone(),
                    DownloadOutcome::Success(_) => String::new(),
                };
                UnitFailure {
                    unit_label: result.unit.label(),
                    attempts: result.attempts,
                    reason,
                }
            })
            .collect()
    }

    /// A run is usable when every pair produced at least some data.
    pub fn all_pairs_have_data(&self) -> bool {
        self.pairs.iter().all(|p| p.observations > 0)
    }

    pub fn total_gaps(&self) -> usize {
        self.pairs.iter().map(|p| p.gap_count).sum()
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Run Summary ===\n");
        summary.push_str(&format!(
            "Pairs processed: {} ({} with data)\n",
            self.pairs.len(),
            self.pairs.iter().filter(|p| p.observations > 0).count()
        ));
        summary.push_str(&format!("Recorded gaps: {}\n", self.total_gaps()));
        summary.push_str(&format!(
            "Permanently failed downloads: {}\n",
            self.permanent_failures.len()
        ));

        for pair in &self.pairs {
            summary.push_str(&format!(
                "  {}/{}: {} hourly observations, {} days, {} weeks, {} gaps ({} files, {} skipped)\n",
                pair.variable,
                pair.location,
                pair.observations,
                pair.days,
                pair.weeks,
                pair.gap_count,
                pair.files_used,
                pair.files_skipped,
            ));
        }

        if !self.permanent_failures.is_empty() {
            summary.push_str("\nMissing data:\n");
            for failure in &self.permanent_failures {
                summary.push_str(&format!(
                    "  {} after {} attempt(s): {}\n",
                    failure.unit_label, failure.attempts, failure.reason
                ));
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(observations: usize, gaps: usize) -> PairSummary {
        PairSummary {
            variable: "temperature".to_string(),
            location: "dakar".to_string(),
            observations,
            days: observations / 24,
            weeks: 1,
            gap_count: gaps,
            files_used: 1,
            files_skipped: 0,
        }
    }

    #[test]
    fn test_all_pairs_have_data() {
        let summary = RunSummary::new(vec![pair(24, 0)], vec![]);
        assert!(summary.all_pairs_have_data());

        let summary = RunSummary::new(vec![pair(24, 0), pair(0, 0)], vec![]);
        assert!(!summary.all_pairs_have_data());
    }

    #[test]
    fn test_summary_lists_failures() {
        let summary = RunSummary::new(
            vec![pair(24, 3)],
            vec![UnitFailure {
                unit_label: "tavg1_2d_slv_Nx 2023-01-02".to_string(),
                attempts: 1,
                reason: "authentication rejected (401)".to_string(),
            }],
        );

        let text = summary.generate_summary();
        assert!(text.contains("Permanently failed downloads: 1"));
        assert!(text.contains("tavg1_2d_slv_Nx 2023-01-02"));
        assert!(text.contains("Recorded gaps: 3"));
    }
}
