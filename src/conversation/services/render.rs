//! HTML message rendering.
//!
//! Every template name ends in `.html`, so `minijinja` escapes interpolated
//! values before they reach the transport's HTML parse mode.

use super::FlowError;
use crate::directory::domain::{NamedCount, Organization, Statistics, User};
use crate::notification::domain::BroadcastReport;
use crate::task::{
    domain::{Task, TaskStatus},
    ports::TaskDetails,
};
use minijinja::{Environment, Value, context};

const TEMPLATES: [(&str, &str); 13] = [
    (
        "broadcast.html",
        include_str!("../../../templates/broadcast.html"),
    ),
    (
        "organization_event.html",
        include_str!("../../../templates/organization_event.html"),
    ),
    (
        "organizations.html",
        include_str!("../../../templates/organizations.html"),
    ),
    (
        "role_change.html",
        include_str!("../../../templates/role_change.html"),
    ),
    (
        "statistics.html",
        include_str!("../../../templates/statistics.html"),
    ),
    (
        "status_changed.html",
        include_str!("../../../templates/status_changed.html"),
    ),
    (
        "status_outcome.html",
        include_str!("../../../templates/status_outcome.html"),
    ),
    (
        "task_assigned.html",
        include_str!("../../../templates/task_assigned.html"),
    ),
    (
        "task_card.html",
        include_str!("../../../templates/task_card.html"),
    ),
    (
        "task_created.html",
        include_str!("../../../templates/task_created.html"),
    ),
    (
        "task_list.html",
        include_str!("../../../templates/task_list.html"),
    ),
    ("users.html", include_str!("../../../templates/users.html")),
    ("welcome.html", include_str!("../../../templates/welcome.html")),
];

/// Result of a status button press, as shown to the employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusOutcome {
    Changed { to: TaskStatus },
    Already { status: TaskStatus },
    Terminal { status: TaskStatus },
    Backward { from: TaskStatus, to: TaskStatus },
    Stale { observed: TaskStatus },
    Frozen,
}

impl StatusOutcome {
    /// Classifies a refused change from the status found in the store.
    ///
    /// A forward move that was refused lost to a concurrent update.
    pub(crate) const fn refused(from: TaskStatus, to: TaskStatus) -> Self {
        if from.is_terminal() {
            Self::Terminal { status: from }
        } else if from.can_transition_to(to) {
            Self::Stale { observed: from }
        } else {
            Self::Backward { from, to }
        }
    }
}

/// Which side of a role change a message addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Audience {
    Actor,
    Target,
}

/// Human label of a status.
pub(crate) const fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::New => "🆕 New",
        TaskStatus::Accepted => "✅ Accepted",
        TaskStatus::Completed => "🎉 Completed",
        TaskStatus::Rejected => "❌ Rejected",
    }
}

/// Template environment holding every bundled message.
#[derive(Debug, Clone)]
pub(crate) struct Renderer {
    environment: Environment<'static>,
}

impl Renderer {
    pub(crate) fn new() -> Result<Self, FlowError> {
        let mut environment = Environment::new();
        for (name, source) in TEMPLATES {
            environment
                .add_template(name, source)
                .map_err(|err| FlowError::Render(err.to_string()))?;
        }
        Ok(Self { environment })
    }

    fn render(&self, name: &str, ctx: Value) -> Result<String, FlowError> {
        self.environment
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|err| FlowError::Render(format!("{name}: {err}")))
    }

    pub(crate) fn welcome(&self, user: Option<&User>) -> Result<String, FlowError> {
        self.render(
            "welcome.html",
            context! {
                registered => user.is_some(),
                name => user.map(|found| found.full_name().as_str()),
                role => user.map(|found| found.role().as_str()),
            },
        )
    }

    pub(crate) fn task_card(&self, task: &Task, manager: &str) -> Result<String, FlowError> {
        self.render(
            "task_card.html",
            context! {
                id => task.id().value(),
                title => task.title().as_str(),
                description => task.description().as_str(),
                manager,
                status => status_label(task.status()),
            },
        )
    }

    pub(crate) fn task_assigned(
        &self,
        task: &Task,
        manager: &str,
    ) -> Result<String, FlowError> {
        self.render(
            "task_assigned.html",
            context! {
                id => task.id().value(),
                title => task.title().as_str(),
                description => task.description().as_str(),
                manager,
            },
        )
    }

    pub(crate) fn task_created(
        &self,
        task: &Task,
        employee: &str,
        delivered: bool,
    ) -> Result<String, FlowError> {
        self.render(
            "task_created.html",
            context! {
                id => task.id().value(),
                title => task.title().as_str(),
                employee,
                delivered,
            },
        )
    }

    pub(crate) fn task_list(
        &self,
        heading: &str,
        tasks: &[TaskDetails],
        for_manager: bool,
        truncated: bool,
    ) -> Result<String, FlowError> {
        let entries: Vec<Value> = tasks
            .iter()
            .map(|details| {
                let (counterpart_label, counterpart) = if for_manager {
                    ("Employee", details.employee_name.as_str())
                } else {
                    ("Manager", details.manager_name.as_str())
                };
                context! {
                    id => details.task.id().value(),
                    title => details.task.title().as_str(),
                    description => details.task.description().as_str(),
                    counterpart_label,
                    counterpart,
                    status => status_label(details.task.status()),
                    created_at => details.task.created_at().format("%Y-%m-%d %H:%M UTC").to_string(),
                }
            })
            .collect();
        self.render(
            "task_list.html",
            context! { heading, tasks => entries, truncated },
        )
    }

    pub(crate) fn status_outcome(
        &self,
        task: &Task,
        outcome: StatusOutcome,
    ) -> Result<String, FlowError> {
        let (kind, from, to) = match outcome {
            StatusOutcome::Changed { to } => ("changed", None, Some(to)),
            StatusOutcome::Already { status } => ("already", None, Some(status)),
            StatusOutcome::Terminal { status } => ("terminal", Some(status), None),
            StatusOutcome::Backward { from, to } => ("backward", Some(from), Some(to)),
            StatusOutcome::Stale { observed } => ("stale", Some(observed), None),
            StatusOutcome::Frozen => ("frozen", None, None),
        };
        self.render(
            "status_outcome.html",
            context! {
                outcome => kind,
                id => task.id().value(),
                title => task.title().as_str(),
                from => from.map(status_label),
                to => to.map(status_label),
            },
        )
    }

    pub(crate) fn status_changed(
        &self,
        task: &Task,
        employee: &str,
        from: TaskStatus,
    ) -> Result<String, FlowError> {
        self.render(
            "status_changed.html",
            context! {
                employee,
                employee_id => task.employee().value(),
                id => task.id().value(),
                title => task.title().as_str(),
                from => status_label(from),
                to => status_label(task.status()),
            },
        )
    }

    pub(crate) fn organizations(&self, organizations: &[Organization]) -> Result<String, FlowError> {
        let entries: Vec<Value> = organizations
            .iter()
            .map(|organization| {
                context! {
                    id => organization.id().value(),
                    name => organization.name().as_str(),
                }
            })
            .collect();
        self.render(
            "organizations.html",
            context! { organizations => entries },
        )
    }

    pub(crate) fn users(
        &self,
        heading: &str,
        empty: &str,
        users: &[User],
        organizations: &[Organization],
    ) -> Result<String, FlowError> {
        let entries: Vec<Value> = users
            .iter()
            .map(|user| {
                let organization = user.organization().and_then(|id| {
                    organizations
                        .iter()
                        .find(|candidate| candidate.id() == id)
                        .map(|found| found.name().as_str())
                });
                context! {
                    id => user.id().value(),
                    name => user.full_name().as_str(),
                    role => user.role().as_str(),
                    organization,
                }
            })
            .collect();
        self.render(
            "users.html",
            context! { heading, empty, users => entries },
        )
    }

    pub(crate) fn statistics(&self, stats: &Statistics) -> Result<String, FlowError> {
        let by_status: Vec<Value> = stats
            .tasks_by_status
            .iter()
            .map(|entry| context! { status => status_label(entry.status), count => entry.count })
            .collect();
        let named = |entries: &[NamedCount]| -> Vec<Value> {
            entries
                .iter()
                .map(|entry| context! { name => entry.name.as_str(), count => entry.count })
                .collect()
        };
        self.render(
            "statistics.html",
            context! {
                stats => context! {
                    total_users => stats.total_users,
                    total_organizations => stats.total_organizations,
                    total_tasks => stats.total_tasks,
                    managers => stats.managers,
                    employees => stats.employees,
                    tasks_by_status => by_status,
                    tasks_per_organization => named(&stats.tasks_per_organization),
                    tasks_per_manager => named(&stats.tasks_per_manager),
                    completed_per_employee => named(&stats.completed_per_employee),
                },
            },
        )
    }

    pub(crate) fn organization_created(
        &self,
        organization: &Organization,
    ) -> Result<String, FlowError> {
        self.organization_event("created", organization, 0, 0)
    }

    pub(crate) fn confirm_organization_deletion(
        &self,
        organization: &Organization,
    ) -> Result<String, FlowError> {
        self.organization_event("confirm_delete", organization, 0, 0)
    }

    pub(crate) fn organization_deleted(
        &self,
        organization: &Organization,
        demoted: usize,
        removed_tasks: u64,
    ) -> Result<String, FlowError> {
        self.organization_event("deleted", organization, demoted, removed_tasks)
    }

    pub(crate) fn organization_member_notice(
        &self,
        organization: &Organization,
    ) -> Result<String, FlowError> {
        self.organization_event("member_notice", organization, 0, 0)
    }

    fn organization_event(
        &self,
        event: &str,
        organization: &Organization,
        demoted: usize,
        removed_tasks: u64,
    ) -> Result<String, FlowError> {
        self.render(
            "organization_event.html",
            context! {
                event,
                id => organization.id().value(),
                name => organization.name().as_str(),
                demoted,
                removed_tasks,
            },
        )
    }

    pub(crate) fn role_change(
        &self,
        audience: Audience,
        granted: bool,
        user: &User,
        role: &str,
        organization: Option<&Organization>,
    ) -> Result<String, FlowError> {
        let audience_name = match audience {
            Audience::Actor => "actor",
            Audience::Target => "target",
        };
        self.render(
            "role_change.html",
            context! {
                audience => audience_name,
                granted,
                name => user.full_name().as_str(),
                role,
                organization => organization.map(|found| found.name().as_str()),
            },
        )
    }

    pub(crate) fn broadcast(&self, text: &str) -> Result<String, FlowError> {
        self.render("broadcast.html", context! { text })
    }
}

/// Plain summary of a finished broadcast.
pub(crate) fn broadcast_summary(report: BroadcastReport) -> String {
    format!(
        "Broadcast finished. Delivered: {}, failed: {}.",
        report.sent, report.failed
    )
}
