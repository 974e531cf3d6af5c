//! Bot API implementation of the [`Notifier`] port.

use crate::directory::domain::UserId;
use crate::notification::{
    domain::{DeliveryFailure, Keyboard, OutboundMessage},
    ports::{DeliveryResult, Notifier},
};
use async_trait::async_trait;
use teloxide::{
    ApiError, RequestError,
    payloads::SendMessageSetters,
    prelude::*,
    types::{
        ChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
        KeyboardRemove, ParseMode, ReplyMarkup,
    },
};

/// Sends outbound messages as HTML through the Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    /// Wraps a bot handle.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, recipient: UserId, message: &OutboundMessage) -> DeliveryResult {
        let mut request = self
            .bot
            .send_message(ChatId(recipient.value()), message.text())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = reply_markup(message.keyboard()) {
            request = request.reply_markup(markup);
        }
        request.await.map(|_| ()).map_err(classify)
    }
}

fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Unchanged => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Reply(rows) => {
            let buttons = rows
                .iter()
                .map(|row| row.iter().map(KeyboardButton::new).collect())
                .collect::<Vec<Vec<_>>>();
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(buttons).resize_keyboard(),
            ))
        }
        Keyboard::Inline(rows) => {
            let buttons = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton::callback(button.label(), button.payload()))
                        .collect()
                })
                .collect::<Vec<Vec<_>>>();
            Some(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
                buttons,
            )))
        }
    }
}

/// Splits Bot API errors into permanent and transient delivery failures.
fn classify(err: RequestError) -> DeliveryFailure {
    match err {
        RequestError::Api(
            api @ (ApiError::BotBlocked
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated
            | ApiError::BotKicked),
        ) => DeliveryFailure::Unreachable(api.to_string()),
        other => DeliveryFailure::Transient(other.to_string()),
    }
}
