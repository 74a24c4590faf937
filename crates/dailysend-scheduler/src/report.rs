//! Run reports: the text sent to the report number, and one summary line per outcome.
//! Pure formatting; dispatch belongs to the caller.

use chrono::{NaiveDate, NaiveDateTime};

/// Lifetime success rate in percent; 0.0 when nothing was attempted.
pub fn success_rate(sent: u64, failed: u64) -> f64 {
    let total = sent + failed;
    if total == 0 {
        0.0
    } else {
        sent as f64 / total as f64 * 100.0
    }
}

/// Render the daily report message.
pub fn format_report(
    sent: u64,
    failed: u64,
    total_sent: u64,
    total_failed: u64,
    at: NaiveDateTime,
) -> String {
    format!(
        "📊 *DAILY REPORT*\n\
         ━━━━━━━━━━━━━━━━\n\
         ⏰ {}\n\
         \n\
         *Today's Batch:*\n\
         ✅ Sent: {sent}\n\
         ❌ Failed: {failed}\n\
         \n\
         *Overall Progress:*\n\
         📨 Total Sent: {total_sent}\n\
         ❌ Total Failed: {total_failed}\n\
         📈 Success Rate: {:.1}%\n\
         ━━━━━━━━━━━━━━━━",
        at.format("%d-%m-%Y %H:%M"),
        success_rate(total_sent, total_failed),
    )
}

/// Counters and positions of one run that reached the sending stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Date the batch work began.
    pub date: NaiveDate,
    /// First catalog index of the slice.
    pub start: usize,
    /// Cursor after the run.
    pub end: usize,
    pub sent: u64,
    pub failed: u64,
    pub total_sent: u64,
    pub total_failed: u64,
    pub catalog_size: usize,
    pub daily_limit: usize,
    /// Whether the report reached the report number.
    pub report_dispatched: bool,
}

impl RunSummary {
    pub fn attempted(&self) -> u64 {
        self.sent + self.failed
    }

    pub fn remaining(&self) -> usize {
        self.catalog_size.saturating_sub(self.end)
    }

    /// Runs still needed to reach the end of the catalog.
    pub fn days_remaining(&self) -> usize {
        self.remaining().div_ceil(self.daily_limit.max(1))
    }
}

/// How a run ended. Fatal aborts are errors, not outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A run already started today; nothing was touched.
    Skipped {
        last_run_date: Option<NaiveDate>,
        total_sent: u64,
    },
    /// The cursor is at or past the end of the catalog.
    Exhausted { index: usize, catalog_size: usize },
    /// Today's slice was fully processed.
    Completed(RunSummary),
    /// Shutdown was requested between contacts; progress was saved.
    Interrupted(RunSummary),
}

impl RunOutcome {
    /// Stable keyword, handy for grepping logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Exhausted { .. } => "exhausted",
            Self::Completed(_) => "completed",
            Self::Interrupted(_) => "interrupted",
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Completed(s) | Self::Interrupted(s) => Some(s),
            _ => None,
        }
    }

    /// One distinct line per outcome.
    pub fn describe(&self) -> String {
        match self {
            Self::Skipped {
                last_run_date,
                total_sent,
            } => format!(
                "[skipped] already ran today (last run {}, total sent {total_sent})",
                last_run_date.map_or_else(|| "never".to_string(), |d| d.to_string())
            ),
            Self::Exhausted {
                index,
                catalog_size,
            } => format!("[exhausted] all contacts completed (cursor {index} of {catalog_size})"),
            Self::Completed(s) => format!(
                "[completed] sent {} failed {} (indices {}..{}), {} remaining",
                s.sent,
                s.failed,
                s.start,
                s.end,
                s.remaining()
            ),
            Self::Interrupted(s) => format!(
                "[interrupted] stopped at index {} after {} of today's contacts, progress saved",
                s.end,
                s.attempted()
            ),
        }
    }
}

/// The line printed when a run aborts instead of producing an outcome.
pub fn describe_fatal(err: &impl std::fmt::Display) -> String {
    format!("[fatal] run aborted: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(18, 5, 0)
            .unwrap()
    }

    fn summary() -> RunSummary {
        RunSummary {
            date: at().date(),
            start: 5,
            end: 10,
            sent: 4,
            failed: 1,
            total_sent: 9,
            total_failed: 1,
            catalog_size: 12,
            daily_limit: 5,
            report_dispatched: true,
        }
    }

    #[test]
    fn test_success_rate_zero_denominator() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(3, 1), 75.0);
        assert_eq!(success_rate(0, 4), 0.0);
    }

    #[test]
    fn test_report_layout() {
        let text = format_report(4, 1, 9, 1, at());
        assert!(text.contains("DAILY REPORT"));
        assert!(text.contains("⏰ 14-03-2026 18:05"));
        assert!(text.contains("✅ Sent: 4"));
        assert!(text.contains("❌ Failed: 1"));
        assert!(text.contains("📨 Total Sent: 9"));
        assert!(text.contains("Success Rate: 90.0%"));
    }

    #[test]
    fn test_report_with_no_history() {
        let text = format_report(0, 0, 0, 0, at());
        assert!(text.contains("Success Rate: 0.0%"));
    }

    #[test]
    fn test_summary_math() {
        let s = summary();
        assert_eq!(s.attempted(), 5);
        assert_eq!(s.remaining(), 2);
        assert_eq!(s.days_remaining(), 1);
    }

    #[test]
    fn test_outcomes_are_distinguishable() {
        let outcomes = [
            RunOutcome::Skipped {
                last_run_date: Some(at().date()),
                total_sent: 9,
            },
            RunOutcome::Exhausted {
                index: 12,
                catalog_size: 12,
            },
            RunOutcome::Completed(summary()),
            RunOutcome::Interrupted(summary()),
        ];
        let lines: Vec<String> = outcomes.iter().map(|o| o.describe()).collect();
        for (outcome, line) in outcomes.iter().zip(&lines) {
            assert!(line.starts_with(&format!("[{}]", outcome.kind())));
        }
        assert!(lines[1].contains("all contacts completed"));

        let fatal = describe_fatal(&"persistence failure: disk full");
        assert_eq!(fatal, "[fatal] run aborted: persistence failure: disk full");
        assert!(lines.iter().all(|l| !l.starts_with("[fatal]")));
    }
}
