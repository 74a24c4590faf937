//! Batch engine: runs at most one quota-sized slice of the catalog per day.
//!
//! ```text
//! Idle ─ guard ─▶ Skipped
//!   │
//!   ▼
//! Loading → Validating → Slicing ─ cursor at end ─▶ Exhausted
//!                           │
//!                           ▼
//!                        Sending (Attempt → Recorded, paced, checkpointed)
//!                           │
//!                           ▼
//!                        Reporting → Completed | Interrupted
//! ```
//!
//! Strictly sequential: one contact at a time, a pacing delay between sends.
//! A failed delivery consumes its slot and is never retried in the same run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use dailysend_contacts::{ContactCatalog, ContactValidator};
use dailysend_core::config::DailySendConfig;
use dailysend_core::error::{DailySendError, Result};
use dailysend_core::traits::{ContactSource, Deliverer};
use tokio::sync::watch;

use crate::progress::Progress;
use crate::report::{RunOutcome, RunSummary, format_report};
use crate::store::ProgressStore;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// The daily batch scheduler.
pub struct BatchScheduler {
    config: DailySendConfig,
    store: ProgressStore,
    source: Arc<dyn ContactSource>,
    deliverer: Arc<dyn Deliverer>,
    /// Flips to `true` when a graceful shutdown is requested.
    shutdown: Option<watch::Receiver<bool>>,
}

impl BatchScheduler {
    /// Create a scheduler whose progress lives at `config.progress_path`.
    pub fn new(
        config: DailySendConfig,
        source: Arc<dyn ContactSource>,
        deliverer: Arc<dyn Deliverer>,
    ) -> Self {
        let store = ProgressStore::new(&config.progress_path_buf());
        Self {
            config,
            store,
            source,
            deliverer,
            shutdown: None,
        }
    }

    /// Use a specific progress store.
    pub fn with_store(mut self, store: ProgressStore) -> Self {
        self.store = store;
        self
    }

    /// Stop between contacts once the receiver observes `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run today's batch (process-local calendar date).
    pub async fn run(&mut self) -> Result<RunOutcome> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Run the batch as if the local date were `today`.
    pub async fn run_on(&mut self, today: NaiveDate) -> Result<RunOutcome> {
        let mut progress = self.store.try_load()?;

        if !progress.should_run_today(today) {
            tracing::info!(
                "✅ Already ran today ({}), total sent {}",
                today,
                progress.total_sent
            );
            return Ok(RunOutcome::Skipped {
                last_run_date: progress.last_run_date,
                total_sent: progress.total_sent,
            });
        }

        let validator = ContactValidator::new(self.config.phone_digits);
        let (catalog, _stats) =
            ContactCatalog::load(self.source.as_ref(), &self.config.source_patterns, &validator)?;

        let start = progress.index;
        if start >= catalog.len() {
            tracing::info!("🎉 All contacts completed! (cursor {} of {})", start, catalog.len());
            return Ok(RunOutcome::Exhausted {
                index: start,
                catalog_size: catalog.len(),
            });
        }
        let end = (start + self.config.daily_limit).min(catalog.len());
        let batch = catalog.slice(start, end);
        let attachment = self.resolve_attachment()?;

        tracing::info!(
            "📊 Today's batch: indices {}..{} ({} messages, {} remaining after today)",
            start,
            end,
            batch.len(),
            catalog.len() - end
        );
        tracing::info!(
            "🚀 Sending via {} with {} (delay {} min)",
            self.deliverer.name(),
            attachment.display(),
            self.config.delay_minutes
        );

        // Stamp the date before any send so a crash cannot lead to a second run today.
        progress.last_run_date = Some(today);
        self.checkpoint(&mut progress)?;

        let mut sent = 0u64;
        let mut failed = 0u64;
        let mut interrupted = false;

        for (i, contact) in batch.iter().enumerate() {
            if self.shutdown_requested() {
                interrupted = true;
                break;
            }

            tracing::info!("📤 Sending to: {} ({})", contact.name, contact.phone);
            match self.deliverer.send(contact, &attachment).await {
                Ok(receipt) => {
                    sent += 1;
                    progress.record(true);
                    tracing::info!("   ✅ Sent! Code: {}", receipt.attempt_code);
                }
                Err(e) => {
                    failed += 1;
                    progress.record(false);
                    tracing::warn!("   ❌ Send error for {}: {e}", contact.phone);
                }
            }

            let processed = i + 1;
            if processed % self.config.checkpoint_every == 0 {
                self.checkpoint(&mut progress)?;
                tracing::info!(
                    "📊 Progress update: {}/{} (✅ {} | ❌ {})",
                    processed,
                    batch.len(),
                    sent,
                    failed
                );
            }

            if processed < batch.len() && !self.pace().await {
                interrupted = true;
                break;
            }
        }

        self.checkpoint(&mut progress)?;
        if interrupted {
            tracing::warn!("🛑 Shutdown requested; stopped at index {}", progress.index);
        }

        let report = format_report(
            sent,
            failed,
            progress.total_sent,
            progress.total_failed,
            Local::now().naive_local(),
        );
        let report_dispatched = self.dispatch_report(&report).await;

        let summary = RunSummary {
            date: today,
            start,
            end: progress.index,
            sent,
            failed,
            total_sent: progress.total_sent,
            total_failed: progress.total_failed,
            catalog_size: catalog.len(),
            daily_limit: self.config.daily_limit,
            report_dispatched,
        };
        Ok(if interrupted {
            RunOutcome::Interrupted(summary)
        } else {
            RunOutcome::Completed(summary)
        })
    }

    /// Persist progress; a failure here aborts the run.
    fn checkpoint(&self, progress: &mut Progress) -> Result<()> {
        progress.last_updated = Some(Local::now().naive_local());
        let first = match self.store.save(progress) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        tracing::warn!("⚠️ Checkpoint failed ({first}), retrying once");
        self.store.save(progress).inspect_err(|e| {
            tracing::error!(
                "🚨 PERSISTENCE FAILURE: {e}. Unsaved state: index={}, total_sent={}, total_failed={}",
                progress.index,
                progress.total_sent,
                progress.total_failed
            );
        })
    }

    /// Wait out the pacing delay. Returns `false` if shutdown interrupted it.
    async fn pace(&mut self) -> bool {
        let delay = self.config.delay();
        if delay.is_zero() {
            return !self.shutdown_requested();
        }
        tracing::info!("   ⏳ Waiting {} minute(s)...", self.config.delay_minutes);
        match self.shutdown.as_mut() {
            None => {
                tokio::time::sleep(delay).await;
                true
            }
            Some(rx) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = wait_for_shutdown(rx) => false,
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Send the report; failures are logged, never fatal.
    async fn dispatch_report(&self, report: &str) -> bool {
        if self.config.report_number.is_empty() {
            tracing::warn!("⚠️ No report_number configured; report not sent");
            return false;
        }
        tracing::info!("📊 Sending report to {}...", self.config.report_number);
        match self
            .deliverer
            .send_text(&self.config.report_number, report)
            .await
        {
            Ok(()) => {
                tracing::info!("   ✅ Report sent!");
                true
            }
            Err(e) => {
                tracing::warn!("   ❌ Report failed: {e}");
                false
            }
        }
    }

    fn resolve_attachment(&self) -> Result<PathBuf> {
        if let Some(path) = self.config.attachment_path() {
            return if path.is_file() {
                Ok(path)
            } else {
                Err(DailySendError::MissingAttachment { path })
            };
        }
        let dir = self.config.source_dir_path();
        find_image(&dir).ok_or(DailySendError::MissingAttachment { path: dir })
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // Sender gone: nobody can ask us to stop any more.
        std::future::pending::<()>().await;
    }
}

/// First image in `dir`: `.jpg` files before `.png` before `.jpeg`, by name within each.
pub fn find_image(dir: &Path) -> Option<PathBuf> {
    let mut images: Vec<(usize, PathBuf)> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            let rank = IMAGE_EXTENSIONS.iter().position(|e| *e == ext)?;
            Some((rank, path))
        })
        .collect();
    images.sort();
    images.into_iter().next().map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_image_prefers_jpg() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"png").unwrap();
        std::fs::write(dir.path().join("z.jpg"), b"jpg").unwrap();
        std::fs::write(dir.path().join("a.jpeg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("SDB (1).csv"), b"").unwrap();

        let found = find_image(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "z.jpg");
    }

    #[test]
    fn test_find_image_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        assert!(find_image(dir.path()).is_none());
        assert!(find_image(&dir.path().join("missing")).is_none());
    }
}
