//! # DailySend Scheduler
//!
//! Resumable once-a-day batch engine. Sends a fixed quota of personalized
//! messages per calendar day and persists its cursor so the next day's run
//! continues exactly where the last one stopped.
//!
//! ## Guarantees
//! - At most one run per local calendar day (date-stamped at run start)
//! - The cursor only moves forward; a failed contact still consumes its slot
//! - Progress is checkpointed every N contacts and at run end, atomically
//! - A checkpoint failure aborts the run loudly instead of losing counters
//!
//! ## Architecture
//! ```text
//! BatchScheduler::run
//!   ├── ProgressStore::try_load ── guard ──▶ Skipped
//!   ├── ContactCatalog::load (dailysend-contacts)
//!   ├── slice [index, index + daily_limit) ──▶ Exhausted
//!   ├── Deliverer::send × N (paced, checkpointed)
//!   └── format_report → Deliverer::send_text(report_number)
//! ```

pub mod engine;
pub mod progress;
pub mod report;
pub mod store;

pub use engine::{BatchScheduler, find_image};
pub use progress::Progress;
pub use report::{RunOutcome, RunSummary, describe_fatal, format_report, success_rate};
pub use store::{ProgressStore, should_run_today};
