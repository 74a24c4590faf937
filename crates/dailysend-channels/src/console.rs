//! Console deliverer: logs what would be sent instead of sending it.
//!
//! Used for dry runs: the full pipeline executes (catalog, slicing, pacing,
//! checkpoints, report) without any network traffic.

use std::path::Path;

use async_trait::async_trait;
use dailysend_core::error::Result;
use dailysend_core::traits::Deliverer;
use dailysend_core::types::{Contact, DeliveryReceipt};

use crate::template::MessageTemplate;

pub struct ConsoleDeliverer {
    template: MessageTemplate,
}

impl ConsoleDeliverer {
    pub fn new(template: MessageTemplate) -> Self {
        Self { template }
    }
}

#[async_trait]
impl Deliverer for ConsoleDeliverer {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, contact: &Contact, attachment: &Path) -> Result<DeliveryReceipt> {
        let message = self.template.render(&contact.name);
        tracing::info!(
            "[dry-run] → {} with {}\n{}",
            contact.phone,
            attachment.display(),
            message.text
        );
        Ok(DeliveryReceipt {
            attempt_code: message.code,
        })
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        tracing::info!("[dry-run] → {}\n{}", to, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_always_succeeds() {
        let d = ConsoleDeliverer::new(MessageTemplate::new("Hi {name} {code}", "friend"));
        let receipt = d
            .send(&Contact::new("9876543210", "Ravi Kale"), Path::new("banner.jpg"))
            .await
            .unwrap();
        assert_eq!(receipt.attempt_code.len(), 4);
        d.send_text("9000000000", "report").await.unwrap();
        assert_eq!(d.name(), "console");
    }
}
