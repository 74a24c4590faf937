//! Value types passed between the catalog, the scheduler and the deliverers.

use serde::{Deserialize, Serialize};

/// A validated recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Normalized digits only, exactly the configured length.
    pub phone: String,
    /// Display name as provided by the source.
    pub name: String,
}

impl Contact {
    pub fn new(phone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            name: name.into(),
        }
    }
}

/// One unvalidated `(phone, name)` row read from a contact source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub phone: String,
    pub name: String,
}

impl RawRecord {
    pub fn new(phone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            name: name.into(),
        }
    }
}

/// Proof of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Code embedded in the message (or transport message id).
    pub attempt_code: String,
}
