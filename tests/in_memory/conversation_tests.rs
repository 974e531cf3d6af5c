//! Complete dialogues driven through the public flow controller.

use std::sync::Arc;

use super::helpers::{ADMIN, EMPLOYEE, MANAGER};
use mockable::DefaultClock;
use taskbot::conversation::{
    adapters::memory::InMemoryFlowStore, domain::Inbound, services::FlowController,
};
use taskbot::directory::{domain::UserId, services::RegistryService};
use taskbot::notification::{
    adapters::memory::RecordingNotifier, domain::OutboundMessage,
    services::NotificationDispatcher,
};
use taskbot::storage::memory::InMemoryStore;
use taskbot::task::{domain::OrphanPolicy, services::TaskLifecycleService};

type Bot = FlowController<InMemoryStore, InMemoryFlowStore, RecordingNotifier, DefaultClock>;

struct Chat {
    bot: Bot,
    notifier: RecordingNotifier,
    flows: Arc<InMemoryFlowStore>,
}

impl Chat {
    fn new() -> eyre::Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        let notifier = RecordingNotifier::new();
        let flows = Arc::new(InMemoryFlowStore::new());
        let bot = FlowController::new(
            RegistryService::new(Arc::clone(&store), ADMIN),
            TaskLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::new(DefaultClock),
                OrphanPolicy::Retain,
            ),
            Arc::clone(&flows),
            NotificationDispatcher::new(Arc::new(notifier.clone())),
        )?;
        Ok(Self {
            bot,
            notifier,
            flows,
        })
    }

    async fn say(&self, user: UserId, text: &str) -> Vec<OutboundMessage> {
        self.bot.handle(user, Inbound::from_text(text)).await
    }

    async fn press(&self, user: UserId, payload: &str) -> Vec<OutboundMessage> {
        self.bot
            .handle(user, Inbound::Callback(payload.to_owned()))
            .await
    }

    async fn register(&self, user: UserId, name: &str) {
        self.say(user, "/start").await;
        self.say(user, "Register").await;
        self.say(user, name).await;
    }
}

fn last_text(replies: &[OutboundMessage]) -> &str {
    replies.last().map(OutboundMessage::text).unwrap_or_default()
}

/// Returns the first inline payload starting with `prefix`.
fn payload_with(replies: &[OutboundMessage], prefix: &str) -> eyre::Result<String> {
    replies
        .iter()
        .flat_map(OutboundMessage::payloads)
        .find(|payload| payload.starts_with(prefix))
        .map(str::to_owned)
        .ok_or_else(|| eyre::eyre!("no button starting with {prefix} in {replies:?}"))
}

#[tokio::test(flavor = "multi_thread")]
async fn office_is_set_up_and_task_completed_through_dialogue() -> eyre::Result<()> {
    let chat = Chat::new()?;
    chat.register(ADMIN, "Ada Admin").await;
    chat.register(MANAGER, "Mona Manager").await;
    chat.register(EMPLOYEE, "Eve Employee").await;

    chat.say(ADMIN, "Create organization").await;
    let created = chat.say(ADMIN, "Acme").await;
    assert!(last_text(&created).starts_with("Organization <b>Acme</b> created"));

    let candidates = chat.say(ADMIN, "Assign manager").await;
    let candidate = payload_with(&candidates, &format!("select_user_assign_manager_{MANAGER}"))?;
    let organizations = chat.press(ADMIN, &candidate).await;
    let organization = payload_with(&organizations, "select_org_assign_manager_")?;
    chat.press(ADMIN, &organization).await;

    let employees = chat.say(MANAGER, "Assign employee").await;
    let employee = payload_with(&employees, &format!("select_user_assign_employee_{EMPLOYEE}"))?;
    let confirmed = chat.press(MANAGER, &employee).await;
    assert_eq!(
        last_text(&confirmed),
        "<b>Eve Employee</b> is now employee of <b>Acme</b>."
    );

    let assignees = chat.say(MANAGER, "Assign task").await;
    let assignee = payload_with(&assignees, "select_employee_assign_task_")?;
    chat.press(MANAGER, &assignee).await;
    chat.say(MANAGER, "Stocktake").await;
    chat.say(MANAGER, "Count everything in aisle 4").await;

    let inbox = chat.notifier.delivered_to(EMPLOYEE);
    let review = payload_with(&inbox, "change_task_direct_")?;
    let card = chat.press(EMPLOYEE, &review).await;
    let accept = payload_with(&card, "status_accepted_")?;
    chat.press(EMPLOYEE, &accept).await;

    let batch = chat.say(EMPLOYEE, "Update task status").await;
    let complete = payload_with(&batch, "status_completed_")?;
    let finished = chat.press(EMPLOYEE, &complete).await;
    assert_eq!(
        last_text(&finished),
        "All pending tasks processed. Updated: 1, skipped: 0."
    );

    let completed = chat.say(MANAGER, "Completed tasks").await;
    assert!(last_text(&completed).contains("<b>Stocktake</b>"));
    let manager_inbox = chat.notifier.delivered_to(MANAGER);
    assert_eq!(
        manager_inbox
            .iter()
            .filter(|message| message.text().contains("changed the status of task"))
            .count(),
        2
    );
    assert_eq!(chat.flows.active_flows(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn interleaved_dialogues_keep_separate_state() -> eyre::Result<()> {
    let chat = Chat::new()?;
    let first = UserId::new(501);
    let second = UserId::new(502);

    chat.say(first, "Register").await;
    chat.say(second, "Register").await;
    let first_done = chat.say(first, "First Person").await;
    let second_done = chat.say(second, "Second Person").await;

    assert!(last_text(&first_done).contains("<b>First Person</b>"));
    assert!(last_text(&second_done).contains("<b>Second Person</b>"));
    assert_eq!(chat.flows.active_flows(), 0);
    Ok(())
}
