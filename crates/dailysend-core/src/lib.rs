//! # DailySend Core
//!
//! Shared building blocks: configuration, the error taxonomy, contact and
//! receipt types, and the [`Deliverer`](traits::Deliverer) /
//! [`ContactSource`](traits::ContactSource) capabilities the batch engine drives.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::DailySendConfig;
pub use error::{DailySendError, Result};
pub use traits::{ContactSource, Deliverer};
pub use types::{Contact, DeliveryReceipt, RawRecord};
