//! Handler registry. One function per endpoint family; `handle` is the only
//! place an [`Endpoint`] is matched.

mod auth;
mod crud;
mod dashboard;
mod settings;
mod users;
mod workflow;

use loopback_store::Record;
use serde_json::Value;

use crate::context::{HandlerCtx, Reply};
use crate::endpoint::Endpoint;

pub fn handle(endpoint: &Endpoint, ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    match *endpoint {
        Endpoint::Login => auth::login(ctx),
        Endpoint::Register => auth::register(ctx),
        Endpoint::Refresh => auth::refresh(ctx),
        Endpoint::Me => auth::me(ctx),
        Endpoint::Logout => auth::logout(ctx),
        Endpoint::UpdateProfile => auth::update_profile(ctx),
        Endpoint::ChangePassword => auth::change_password(ctx),

        Endpoint::ListUsers => users::list(ctx),
        Endpoint::UpdateUserRole { user_id } => users::update_role(ctx, user_id),
        Endpoint::UpdateUserModules { user_id } => users::update_modules(ctx, user_id),

        Endpoint::List(r) => crud::list(ctx, r),
        Endpoint::Create(r) => crud::create(ctx, r),
        Endpoint::Get(r, id) => crud::get(ctx, r, id),
        Endpoint::Update(r, id) => crud::update(ctx, r, id),
        Endpoint::Delete(r, id) => crud::delete(ctx, r, id),
        Endpoint::Transition(t, id) => workflow::transition(ctx, t, id),

        Endpoint::CheckIn => workflow::check_in(ctx),
        Endpoint::CheckOut => workflow::check_out(ctx),
        Endpoint::ProjectTasks { project_id } => workflow::project_tasks(ctx, project_id),
        Endpoint::TaskStatus { task_id } => workflow::task_status(ctx, task_id),
        Endpoint::JobCandidates { job_id } => workflow::job_candidates(ctx, job_id),
        Endpoint::CandidateStage { candidate_id } => workflow::candidate_stage(ctx, candidate_id),
        Endpoint::AssignAsset { asset_id } => workflow::assign_asset(ctx, asset_id),
        Endpoint::TicketComment { ticket_id } => workflow::ticket_comment(ctx, ticket_id),

        Endpoint::DashboardStats => dashboard::stats(ctx),
        Endpoint::Notifications => dashboard::notifications(ctx),
        Endpoint::ReadAllNotifications => dashboard::read_all(ctx),
        Endpoint::ReadNotification { notification_id } => dashboard::read_one(ctx, notification_id),

        Endpoint::CompanySettings => settings::company(ctx),
        Endpoint::UpdateCompanySettings => settings::update_company(ctx),
        Endpoint::ModuleSettings => settings::modules(ctx),
    }
}

/// A user record as clients see it.
pub(crate) fn public_user(user: &Record) -> Value {
    let mut user = user.clone();
    if let Some(obj) = user.as_object_mut() {
        obj.remove("password");
    }
    user
}

/// `first_name last_name` of a person record.
pub(crate) fn full_name(record: &Record) -> Option<String> {
    let first = record.get("first_name").and_then(Value::as_str)?;
    let last = record.get("last_name").and_then(Value::as_str).unwrap_or("");
    Some(format!("{first} {last}").trim().to_string())
}
