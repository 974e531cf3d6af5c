//! When steps for bot behaviour scenarios.

use super::world::{ADMIN, BotWorld, actor};
use rstest_bdd_macros::when;
use taskbot::conversation::domain::Inbound;

#[when(r#"the {who} presses "{status}" on the task"#)]
fn presses_status(world: &mut BotWorld, who: String, status: String) -> Result<(), eyre::Report> {
    let user = actor(&who)?;
    let task = world.task()?;
    world.handle(user, Inbound::Callback(format!("status_{status}_{task}")));
    Ok(())
}

#[when("the admin deletes the organization")]
fn admin_deletes_organization(world: &mut BotWorld) -> Result<(), eyre::Report> {
    let organization = world
        .organization
        .ok_or_else(|| eyre::eyre!("missing organization in scenario world"))?;
    world.handle(ADMIN, Inbound::from_text("Delete organization"));
    world.handle(ADMIN, Inbound::from_text(&organization.to_string()));
    world.handle(
        ADMIN,
        Inbound::Callback(format!("confirm_delete_org_{organization}")),
    );
    Ok(())
}

#[when("the admin starts deleting the organization but cancels")]
fn admin_cancels_deletion(world: &mut BotWorld) -> Result<(), eyre::Report> {
    let organization = world
        .organization
        .ok_or_else(|| eyre::eyre!("missing organization in scenario world"))?;
    world.handle(ADMIN, Inbound::from_text("Delete organization"));
    world.handle(ADMIN, Inbound::from_text(&organization.to_string()));
    world.handle(ADMIN, Inbound::Callback("cancel_delete_org".to_owned()));
    Ok(())
}
