//! Capabilities the batch engine depends on.
//!
//! The engine never talks to a transport or a filesystem layout directly:
//! it receives a [`Deliverer`] and a [`ContactSource`] and drives them.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Contact, DeliveryReceipt, RawRecord};

/// Outbound message transport.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Stable transport identifier (e.g. `whatsapp`, `console`).
    fn name(&self) -> &str;

    /// Deliver the personalized message plus attachment to one contact.
    /// `Err` means the attempt failed; the caller counts it and moves on.
    async fn send(&self, contact: &Contact, attachment: &Path) -> Result<DeliveryReceipt>;

    /// Send a plain text message, used for run reports.
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;
}

/// Where raw contact rows come from.
pub trait ContactSource: Send + Sync {
    /// Names of every candidate source (e.g. file names in a directory).
    fn list(&self) -> Result<Vec<String>>;

    /// Read one source into raw rows, preserving file order.
    fn read(&self, name: &str) -> Result<Vec<RawRecord>>;
}
