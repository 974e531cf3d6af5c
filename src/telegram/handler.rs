//! Long-polling update loop.

use super::TelegramNotifier;
use crate::conversation::{adapters::memory::InMemoryFlowStore, domain::Inbound, services::FlowController};
use crate::directory::domain::UserId;
use crate::notification::{domain::OutboundMessage, services::NotificationDispatcher};
use crate::storage::Store;
use mockable::DefaultClock;
use std::sync::Arc;
use teloxide::{prelude::*, types::UserId as TelegramUserId};
use tracing::{debug, info, warn};

/// Flow controller wired to the Telegram transport.
pub type BotController<S> = FlowController<S, InMemoryFlowStore, TelegramNotifier, DefaultClock>;

type Replies = NotificationDispatcher<TelegramNotifier>;

/// Polls for updates until Ctrl-C and routes them through `controller`.
///
/// Updates from the same chat are handled one at a time; different chats run
/// concurrently.
pub async fn run<S>(bot: Bot, controller: Arc<BotController<S>>, replies: Replies)
where
    S: Store + 'static,
{
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message::<S>))
        .branch(Update::filter_callback_query().endpoint(on_callback::<S>));

    info!("polling for updates");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller, replies])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("update loop stopped");
}

async fn on_message<S>(
    msg: Message,
    controller: Arc<BotController<S>>,
    replies: Replies,
) -> ResponseResult<()>
where
    S: Store + 'static,
{
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(actor) = msg.from.as_ref().and_then(|sender| to_user_id(sender.id)) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        debug!(user = %actor, "ignoring non-text message");
        return Ok(());
    };
    let outbound = controller.handle(actor, Inbound::from_text(text)).await;
    send_all(&replies, actor, &outbound).await;
    Ok(())
}

async fn on_callback<S>(
    bot: Bot,
    query: CallbackQuery,
    controller: Arc<BotController<S>>,
    replies: Replies,
) -> ResponseResult<()>
where
    S: Store + 'static,
{
    if let Err(err) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %err, "failed to answer callback query");
    }
    let Some(actor) = to_user_id(query.from.id) else {
        return Ok(());
    };
    let Some(payload) = query.data else {
        return Ok(());
    };
    let outbound = controller.handle(actor, Inbound::Callback(payload)).await;
    send_all(&replies, actor, &outbound).await;
    Ok(())
}

async fn send_all(replies: &Replies, actor: UserId, outbound: &[OutboundMessage]) {
    for message in outbound {
        if replies.send(actor, message).await.is_err() {
            break;
        }
    }
}

fn to_user_id(id: TelegramUserId) -> Option<UserId> {
    i64::try_from(id.0).ok().map(UserId::new)
}
