//! Transport-neutral inbound events.

/// Event received from a user's private chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The `/start` command.
    Start,
    /// Any other text message.
    Text(String),
    /// Raw payload of a pressed inline button.
    Callback(String),
}

impl Inbound {
    /// Normalizes a text message, recognizing `/start` with or without a
    /// bot-name suffix or deep-link argument.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let command = text
            .split_whitespace()
            .next()
            .and_then(|word| word.split('@').next())
            .unwrap_or_default();
        if command == "/start" {
            Self::Start
        } else {
            Self::Text(text.to_owned())
        }
    }
}
