//! Then steps for bot behaviour scenarios.

use super::world::{BotWorld, MANAGER, actor, run_async};
use rstest_bdd_macros::then;
use taskbot::directory::domain::Role;
use taskbot::task::domain::TaskStatus;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &BotWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = run_async(world.tasks.find_task(world.task()?))?
        .ok_or_else(|| eyre::eyre!("task vanished"))?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then("the manager is told the status changed")]
fn manager_told(world: &BotWorld) -> Result<(), eyre::Report> {
    let told = world
        .notifier
        .delivered_to(MANAGER)
        .iter()
        .any(|message| message.text().contains("changed the status of task"));
    eyre::ensure!(told, "manager received no status notice");
    Ok(())
}

#[then(r#"the {who} is told "{text}""#)]
fn actor_told(world: &BotWorld, who: String, text: String) -> Result<(), eyre::Report> {
    actor(&who)?;
    let replies: Vec<&str> = world
        .last_replies
        .iter()
        .map(|reply| reply.text())
        .collect();
    eyre::ensure!(
        replies.iter().any(|reply| reply.contains(text.as_str())),
        "expected a reply containing {text:?}, got {replies:?}"
    );
    Ok(())
}

#[then("the {who} has no role")]
fn has_no_role(world: &BotWorld, who: String) -> Result<(), eyre::Report> {
    let user = run_async(world.registry.find_user(actor(&who)?))?
        .ok_or_else(|| eyre::eyre!("{who} is no longer registered"))?;
    eyre::ensure!(user.role() == Role::User, "{who} still has role {}", user.role());
    eyre::ensure!(user.organization().is_none(), "{who} still has an organization");
    Ok(())
}

#[then("the manager still has a role")]
fn manager_keeps_role(world: &BotWorld) -> Result<(), eyre::Report> {
    let user = run_async(world.registry.find_user(MANAGER))?
        .ok_or_else(|| eyre::eyre!("manager is no longer registered"))?;
    eyre::ensure!(user.role() == Role::Manager, "manager lost the role");
    Ok(())
}

#[then("the task no longer exists")]
fn task_gone(world: &BotWorld) -> Result<(), eyre::Report> {
    let task = run_async(world.tasks.find_task(world.task()?))?;
    eyre::ensure!(task.is_none(), "task survived the deletion");
    Ok(())
}
