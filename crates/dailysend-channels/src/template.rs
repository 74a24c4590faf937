//! Message template rendering.
//!
//! `{name}` becomes the last word of the contact's name, `{code}` a random
//! 4-digit code. Each message carries a different code so no two bodies are
//! byte-identical; the code doubles as the delivery attempt id.

use dailysend_core::config::MessageConfig;
use rand::Rng;

/// A rendered message body and the code embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct MessageTemplate {
    template: String,
    fallback_name: String,
}

impl MessageTemplate {
    pub fn new(template: &str, fallback_name: &str) -> Self {
        Self {
            template: template.to_string(),
            fallback_name: fallback_name.to_string(),
        }
    }

    pub fn from_config(config: &MessageConfig) -> Self {
        Self::new(&config.template, &config.fallback_name)
    }

    /// Last whitespace-separated word of `name` (usually the surname).
    pub fn greeting_name(&self, name: &str) -> String {
        name.split_whitespace()
            .last()
            .map(String::from)
            .unwrap_or_else(|| self.fallback_name.clone())
    }

    /// Render with a fresh random code.
    pub fn render(&self, name: &str) -> RenderedMessage {
        self.render_with_code(name, &gen_code())
    }

    pub fn render_with_code(&self, name: &str, code: &str) -> RenderedMessage {
        let text = self
            .template
            .replace("{name}", &self.greeting_name(name))
            .replace("{code}", code);
        RenderedMessage {
            text,
            code: code.to_string(),
        }
    }
}

/// Random 4-digit code, leading zeros kept.
pub fn gen_code() -> String {
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_uses_last_word() {
        let t = MessageTemplate::new("Hi {name}", "friend");
        assert_eq!(t.greeting_name("Asha  Ramesh Patil "), "Patil");
        assert_eq!(t.greeting_name("   "), "friend");
        assert_eq!(t.greeting_name(""), "friend");
    }

    #[test]
    fn test_render_with_code() {
        let t = MessageTemplate::new("👋 Hello {name}\n~{code}~", "friend");
        let msg = t.render_with_code("Ravi Kale", "0042");
        assert_eq!(msg.text, "👋 Hello Kale\n~0042~");
        assert_eq!(msg.code, "0042");
    }

    #[test]
    fn test_gen_code_shape() {
        for _ in 0..50 {
            let code = gen_code();
            assert_eq!(code.len(), 4);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_render_embeds_generated_code() {
        let t = MessageTemplate::from_config(&MessageConfig::default());
        let msg = t.render("Sunita");
        assert!(msg.text.contains("Sunita"));
        assert!(msg.text.contains(&msg.code));
    }
}
