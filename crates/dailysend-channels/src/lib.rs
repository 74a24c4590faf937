//! # DailySend Channels
//!
//! Delivery transports implementing [`Deliverer`](dailysend_core::Deliverer).
//!
//! - [`WhatsAppDeliverer`]: WhatsApp Business Cloud API (image + caption)
//! - [`ConsoleDeliverer`]: logs instead of sending, for dry runs
//!
//! Both render the per-contact body through [`MessageTemplate`].

pub mod console;
pub mod template;
pub mod whatsapp;

pub use console::ConsoleDeliverer;
pub use template::{MessageTemplate, RenderedMessage, gen_code};
pub use whatsapp::WhatsAppDeliverer;
