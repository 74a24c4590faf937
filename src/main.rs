//! # DailySend: resumable once-a-day batch sender
//!
//! Usage:
//!   dailysend                          # Run today's batch (same as `dailysend run`)
//!   dailysend run --dry-run            # Rehearse: log instead of sending
//!   dailysend status                   # Show persisted progress
//!   dailysend check                    # Validate contacts and attachment, send nothing
//!   dailysend --config ~/send.toml     # Custom config file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dailysend_channels::{ConsoleDeliverer, MessageTemplate, WhatsAppDeliverer};
use dailysend_contacts::{ContactCatalog, ContactValidator, CsvDirSource};
use dailysend_core::{DailySendConfig, Deliverer};
use dailysend_scheduler::{
    BatchScheduler, ProgressStore, RunOutcome, describe_fatal, find_image, success_rate,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dailysend",
    version,
    about = "📨 DailySend: resumable once-a-day batch sender"
)]
struct Cli {
    /// Config file (default: ./dailysend.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send today's batch
    Run {
        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Progress file override
        #[arg(long)]
        progress: Option<String>,
    },
    /// Show persisted progress and catalog position
    Status {
        /// Progress file override
        #[arg(long)]
        progress: Option<String>,
    },
    /// Load and validate the contact catalog without sending
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "dailysend=debug,dailysend_scheduler=debug,dailysend_channels=debug,dailysend_contacts=debug"
    } else {
        "dailysend=info,dailysend_scheduler=info,dailysend_channels=info,dailysend_contacts=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => DailySendConfig::load_from(Path::new(&expand_path(path)))?,
        None => DailySendConfig::load()?,
    };

    match cli.command.unwrap_or(Command::Run {
        dry_run: false,
        progress: None,
    }) {
        Command::Run { dry_run, progress } => run(config, dry_run, progress)
            .await
            .inspect_err(|e| eprintln!("{}", describe_fatal(e))),
        Command::Status { progress } => status(&config, progress),
        Command::Check => check(&config),
    }
}

async fn run(config: DailySendConfig, dry_run: bool, progress: Option<String>) -> Result<()> {
    let progress_path = match progress {
        Some(p) => PathBuf::from(expand_path(&p)),
        None if dry_run => dry_run_progress_path(&config.progress_path_buf()),
        None => config.progress_path_buf(),
    };

    println!("📨 DailySend v{}", env!("CARGO_PKG_VERSION"));
    println!("   📂 Contacts:     {}", config.source_dir_path().display());
    println!("   💾 Progress:     {}", progress_path.display());
    println!("   📦 Daily limit:  {}", config.daily_limit);
    println!("   ⏳ Delay:        {} min", config.delay_minutes);
    if dry_run {
        println!("   🧪 Dry run: nothing will be sent");
    }
    println!();

    let template = MessageTemplate::from_config(&config.message);
    let deliverer: Arc<dyn Deliverer> = if dry_run {
        Arc::new(ConsoleDeliverer::new(template))
    } else {
        let whatsapp = WhatsAppDeliverer::new(config.whatsapp.clone(), &config.country_code, template);
        whatsapp.verify().await?;
        Arc::new(whatsapp)
    };
    let source = Arc::new(CsvDirSource::new(&config.source_dir_path()));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Ctrl-C received; finishing the current contact");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut scheduler = BatchScheduler::new(config, source, deliverer)
        .with_store(ProgressStore::new(&progress_path))
        .with_shutdown(shutdown_rx);
    let outcome = scheduler.run().await?;

    println!();
    println!("{}", outcome.describe());
    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    let Some(s) = outcome.summary() else {
        return;
    };
    println!();
    println!("==================================================");
    println!("📊 TODAY'S STATS:");
    println!("   ✅ Sent:   {}", s.sent);
    println!("   ❌ Failed: {}", s.failed);
    println!("   📈 Success Rate: {:.1}%", success_rate(s.sent, s.failed));
    println!();
    println!("📊 OVERALL:");
    println!("   📨 Total Sent:   {}", s.total_sent);
    println!("   ❌ Total Failed: {}", s.total_failed);
    println!("   📋 Remaining:    {}", s.remaining());
    println!("   📅 Days Remaining: ~{}", s.days_remaining());
    if !s.report_dispatched {
        println!("   ⚠️  Report was not delivered");
    }
    println!("==================================================");
}

fn status(config: &DailySendConfig, progress: Option<String>) -> Result<()> {
    let path = progress
        .map(|p| PathBuf::from(expand_path(&p)))
        .unwrap_or_else(|| config.progress_path_buf());
    let progress = ProgressStore::new(&path).try_load()?;

    println!("💾 Progress: {}", path.display());
    println!("   📍 Cursor:       {}", progress.index);
    println!("   📨 Total Sent:   {}", progress.total_sent);
    println!("   ❌ Total Failed: {}", progress.total_failed);
    println!(
        "   📅 Last run:     {}",
        progress
            .last_run_date
            .map_or_else(|| "never".to_string(), |d| d.to_string())
    );
    if let Some(updated) = progress.last_updated {
        println!("   🕒 Last update:  {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }

    let source = CsvDirSource::new(&config.source_dir_path());
    let validator = ContactValidator::new(config.phone_digits);
    match ContactCatalog::load(&source, &config.source_patterns, &validator) {
        Ok((catalog, _)) => {
            let remaining = catalog.len().saturating_sub(progress.index);
            println!("   📋 Catalog:      {} contacts, {} remaining", catalog.len(), remaining);
            println!(
                "   🗓️  Days left:    ~{}",
                remaining.div_ceil(config.daily_limit.max(1))
            );
        }
        Err(e) => println!("   ⚠️  Catalog unavailable: {e}"),
    }
    Ok(())
}

fn check(config: &DailySendConfig) -> Result<()> {
    let dir = config.source_dir_path();
    let source = CsvDirSource::new(&dir);
    let validator = ContactValidator::new(config.phone_digits);
    let (catalog, stats) = ContactCatalog::load(&source, &config.source_patterns, &validator)?;

    println!("📂 {} (pattern '{}')", dir.display(), stats.pattern);
    for loaded in &stats.loaded {
        println!("   ✅ {} ({} rows)", loaded.name, loaded.records);
    }
    for (name, reason) in &stats.failed {
        println!("   ❌ {name}: {reason}");
    }
    println!(
        "   📋 {} valid of {} rows ({} rejected)",
        catalog.len(),
        stats.total_records,
        stats.rejected
    );

    let attachment = config.attachment_path().or_else(|| find_image(&dir));
    match attachment {
        Some(path) if path.is_file() => println!("   🖼️  Attachment: {}", path.display()),
        Some(path) => println!("   ⚠️  Attachment missing: {}", path.display()),
        None => println!("   ⚠️  No image found in {}", dir.display()),
    }
    Ok(())
}

/// `progress.json` → `progress.dry-run.json`, next to the real file.
fn dry_run_progress_path(real: &Path) -> PathBuf {
    let stem = real
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("progress");
    real.with_file_name(format!("{stem}.dry-run.json"))
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}
