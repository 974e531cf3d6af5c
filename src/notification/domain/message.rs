//! Transport-neutral outbound message.

/// Inline button carrying a callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    label: String,
    payload: String,
}

impl Button {
    /// Creates a button showing `label` that sends `payload` when pressed.
    #[must_use]
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }

    /// Returns the visible label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the callback payload.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave the keyboard the recipient currently sees.
    #[default]
    Unchanged,
    /// Hide the reply keyboard.
    Remove,
    /// Reply keyboard of menu labels, one inner vector per row.
    Reply(Vec<Vec<String>>),
    /// Inline keyboard of callback buttons, one inner vector per row.
    Inline(Vec<Vec<Button>>),
}

impl Keyboard {
    /// Builds an inline keyboard with one button per row.
    #[must_use]
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self::Inline(buttons.into_iter().map(|button| vec![button]).collect())
    }
}

/// Message ready to be handed to a [`crate::notification::ports::Notifier`].
///
/// `text` uses the transport's HTML markup; anything derived from user
/// input must already be escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    text: String,
    keyboard: Keyboard,
}

impl OutboundMessage {
    /// Creates a message that leaves the current keyboard in place.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Unchanged,
        }
    }

    /// Attaches a keyboard.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attached keyboard.
    #[must_use]
    pub const fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Returns every inline callback payload, row by row.
    #[must_use]
    pub fn payloads(&self) -> Vec<&str> {
        match &self.keyboard {
            Keyboard::Inline(rows) => rows.iter().flatten().map(Button::payload).collect(),
            Keyboard::Unchanged | Keyboard::Remove | Keyboard::Reply(_) => Vec::new(),
        }
    }
}
