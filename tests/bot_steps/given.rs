//! Given steps for bot behaviour scenarios.

use super::world::{ADMIN, BotWorld, EMPLOYEE, MANAGER, OUTSIDER, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskbot::conversation::domain::Inbound;
use taskbot::directory::{domain::Role, services::AssignRoleRequest};
use taskbot::task::services::CreateTaskRequest;

#[given("an organization with a manager and an employee")]
fn staffed_organization(world: &mut BotWorld) -> Result<(), eyre::Report> {
    for (user, name) in [
        (ADMIN, "Ada Admin"),
        (MANAGER, "Mona Manager"),
        (EMPLOYEE, "Eve Employee"),
        (OUTSIDER, "Otto Outsider"),
    ] {
        run_async(world.registry.register(user, name)).wrap_err("register scenario cast")?;
    }
    let organization = run_async(world.registry.create_organization(ADMIN, "Acme"))
        .wrap_err("create scenario organization")?
        .id();
    run_async(world.registry.assign_role(
        AssignRoleRequest::new(ADMIN, MANAGER, Role::Manager).with_organization(organization),
    ))
    .wrap_err("promote scenario manager")?;
    run_async(
        world
            .registry
            .assign_role(AssignRoleRequest::new(MANAGER, EMPLOYEE, Role::Employee)),
    )
    .wrap_err("enrol scenario employee")?;
    world.organization = Some(organization);
    Ok(())
}

#[given(r#"the manager assigned the task "{title}""#)]
fn manager_assigned_task(world: &mut BotWorld, title: String) -> Result<(), eyre::Report> {
    let task = run_async(world.tasks.create_task(CreateTaskRequest::new(
        MANAGER,
        EMPLOYEE,
        title,
        "Count everything in aisle 4",
    )))
    .wrap_err("hand out scenario task")?;
    world.task = Some(task.id());
    Ok(())
}

#[given(r#"the employee pressed "{status}" on the task"#)]
fn employee_pressed(world: &mut BotWorld, status: String) -> Result<(), eyre::Report> {
    let task = world.task()?;
    world.handle(EMPLOYEE, Inbound::Callback(format!("status_{status}_{task}")));
    Ok(())
}
