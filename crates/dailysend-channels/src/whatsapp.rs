//! WhatsApp Business Cloud API deliverer.
//!
//! Uses the official WhatsApp Business Platform (Cloud API) for messaging.
//! Requires: Access Token + Phone Number ID from Meta Business Suite.
//!
//! Each contact receives the attachment as an image message with the
//! rendered template as caption. The attachment is uploaded once per
//! process and its media id reused.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dailysend_core::config::WhatsAppConfig;
use dailysend_core::error::{DailySendError, Result};
use dailysend_core::traits::Deliverer;
use dailysend_core::types::{Contact, DeliveryReceipt};
use tokio::sync::Mutex;

use crate::template::MessageTemplate;

const GRAPH_URL: &str = "https://graph.facebook.com";

/// WhatsApp Business deliverer implementation.
pub struct WhatsAppDeliverer {
    config: WhatsAppConfig,
    country_code: String,
    template: MessageTemplate,
    client: reqwest::Client,
    /// Uploaded attachment: (local path, media id).
    media: Mutex<Option<(PathBuf, String)>>,
}

impl WhatsAppDeliverer {
    pub fn new(config: WhatsAppConfig, country_code: &str, template: MessageTemplate) -> Self {
        Self {
            config,
            country_code: country_code.to_string(),
            template,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            media: Mutex::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}{}",
            GRAPH_URL, self.config.api_version, self.config.phone_number_id, path
        )
    }

    /// International address for a local number.
    pub fn recipient(&self, phone: &str) -> String {
        format!("{}{}", self.country_code, phone)
    }

    /// Check credentials before a run starts sending.
    pub async fn verify(&self) -> Result<()> {
        if self.config.access_token.is_empty() {
            return Err(DailySendError::Config(
                "WhatsApp access_token not configured".into(),
            ));
        }
        if self.config.phone_number_id.is_empty() {
            return Err(DailySendError::Config(
                "WhatsApp phone_number_id not configured".into(),
            ));
        }

        let response = self
            .client
            .get(self.endpoint(""))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| DailySendError::Config(format!("WhatsApp verification failed: {e}")))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DailySendError::Config(format!(
                "WhatsApp token verification failed: {text}"
            )));
        }
        tracing::info!(
            "WhatsApp Business: connected (phone_id={})",
            self.config.phone_number_id
        );
        Ok(())
    }

    /// Upload the attachment (once) and return its media id.
    async fn media_id(&self, attachment: &Path) -> Result<String> {
        let mut cached = self.media.lock().await;
        if let Some((path, id)) = cached.as_ref()
            && path == attachment
        {
            return Ok(id.clone());
        }

        let bytes = tokio::fs::read(attachment).await.map_err(|e| {
            DailySendError::Delivery(format!("cannot read {}: {e}", attachment.display()))
        })?;
        let mime = mime_for(attachment);
        let file_name = attachment
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| DailySendError::Delivery(format!("WhatsApp media part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime)
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("/media"))
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DailySendError::Delivery(format!("WhatsApp media upload failed: {e}")))?;
        let result = read_json(response).await?;

        let id = result["id"]
            .as_str()
            .ok_or_else(|| DailySendError::Delivery("WhatsApp media upload returned no id".into()))?
            .to_string();
        tracing::info!("📎 Uploaded {} as media {}", attachment.display(), id);
        *cached = Some((attachment.to_path_buf(), id.clone()));
        Ok(id)
    }

    async fn post_message(&self, body: &serde_json::Value) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("/messages"))
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| DailySendError::Delivery(format!("WhatsApp API request failed: {e}")))?;
        let result = read_json(response).await?;

        let msg_id = result["messages"][0]["id"]
            .as_str()
            .unwrap_or("unknown")
            .to_string();
        Ok(msg_id)
    }
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(DailySendError::Delivery(format!(
            "WhatsApp API error {status}: {error_text}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| DailySendError::Delivery(format!("Invalid WhatsApp response: {e}")))
}

/// Image message with caption.
pub fn image_payload(to: &str, media_id: &str, caption: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "image",
        "image": {
            "id": media_id,
            "caption": caption
        }
    })
}

/// Plain text message.
pub fn text_payload(to: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": {
            "preview_url": false,
            "body": text
        }
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl Deliverer for WhatsAppDeliverer {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, contact: &Contact, attachment: &Path) -> Result<DeliveryReceipt> {
        let media_id = self.media_id(attachment).await?;
        let message = self.template.render(&contact.name);
        let to = self.recipient(&contact.phone);

        let msg_id = self
            .post_message(&image_payload(&to, &media_id, &message.text))
            .await?;
        tracing::debug!("WhatsApp message sent: {} → {}", msg_id, to);

        Ok(DeliveryReceipt {
            attempt_code: message.code,
        })
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        let to = self.recipient(to);
        let msg_id = self.post_message(&text_payload(&to, body)).await?;
        tracing::debug!("WhatsApp text sent: {} → {}", msg_id, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliverer(token: &str) -> WhatsAppDeliverer {
        WhatsAppDeliverer::new(
            WhatsAppConfig {
                access_token: token.into(),
                phone_number_id: "1055".into(),
                ..Default::default()
            },
            "91",
            MessageTemplate::new("Hi {name} ~{code}~", "friend"),
        )
    }

    #[test]
    fn test_recipient_adds_country_code() {
        assert_eq!(deliverer("t").recipient("9876543210"), "919876543210");
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            deliverer("t").endpoint("/messages"),
            "https://graph.facebook.com/v21.0/1055/messages"
        );
    }

    #[test]
    fn test_payloads() {
        let image = image_payload("919876543210", "m-1", "Hi Kale");
        assert_eq!(image["type"], "image");
        assert_eq!(image["image"]["id"], "m-1");
        assert_eq!(image["image"]["caption"], "Hi Kale");

        let text = text_payload("919000000000", "report");
        assert_eq!(text["text"]["body"], "report");
        assert_eq!(text["to"], "919000000000");
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a.jpg")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_verify_requires_token() {
        let err = deliverer("").verify().await.unwrap_err();
        assert!(matches!(err, DailySendError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_attachment_fails_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let err = deliverer("t")
            .send(
                &Contact::new("9876543210", "Ravi Kale"),
                &dir.path().join("missing.jpg"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DailySendError::Delivery(_)));
    }
}
