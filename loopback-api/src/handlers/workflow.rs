//! Lifecycle transitions and the resource-specific custom routes.

use chrono::NaiveTime;
use http::StatusCode;
use loopback_core::{bail_api, ApiError, Body, TenantContext};
use loopback_store::query::{field_equals, next_id};
use loopback_store::{Collection, Record};
use serde_json::{json, Map, Value};
use tracing::info;

use super::crud::{filtered, list_reply};
use super::full_name;
use crate::context::{not_found, HandlerCtx, Reply};
use crate::endpoint::{Resource, Transition};

pub const TASK_STATUSES: [&str; 4] = ["todo", "in_progress", "review", "done"];
pub const CANDIDATE_STAGES: [&str; 6] = ["applied", "screening", "interview", "offer", "hired", "rejected"];

fn status_of(record: &Record) -> &str {
    record.get("status").and_then(Value::as_str).unwrap_or("")
}

pub fn transition(ctx: &mut HandlerCtx<'_>, t: Transition, id: i64) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let resource = t.resource();
    let current = ctx
        .repo
        .find_for(resource.collection(), identity.tenant_id, id)
        .ok_or_else(|| not_found(resource.label()))?;

    let status = status_of(current).to_string();
    if let Some(allowed) = t.allowed_from() {
        if !allowed.contains(&status.as_str()) {
            bail_api!(bad_request, "{} is already {}", resource.label(), status);
        }
    }

    let now = ctx.timestamp();
    let note = |field: &str| ctx.request.body.get(field).cloned().unwrap_or(Value::Null);
    let patch = match t {
        Transition::ApproveLeave | Transition::ApproveExpense => json!({
            "status": t.target_status(), "approved_by": identity.user_id, "approved_at": now,
        }),
        Transition::RejectLeave | Transition::RejectExpense => json!({
            "status": t.target_status(), "rejected_by": identity.user_id, "rejected_at": now,
            "rejection_reason": note("reason"),
        }),
        Transition::SubmitReview => json!({ "status": t.target_status(), "submitted_at": now }),
        Transition::ResolveTicket => json!({
            "status": t.target_status(), "resolved_at": now, "resolution": note("resolution"),
        }),
        Transition::CloseTicket => json!({ "status": t.target_status(), "closed_at": now }),
        Transition::ReturnAsset => json!({
            "status": t.target_status(), "assigned_to": null, "returned_at": now,
        }),
    };

    let record = ctx
        .repo
        .update(resource.collection(), id, &patch)
        .ok_or_else(|| not_found(resource.label()))?;
    info!(collection = %resource.collection(), id, action = t.action(), by = identity.user_id, "transition");
    Ok(Reply::ok(record))
}

/// The employee record linked to the caller's user account.
fn linked_employee(ctx: &HandlerCtx<'_>, identity: &TenantContext) -> anyhow::Result<Record> {
    let from_body = ctx.request.body_i64("employee_id");
    let from_user = ctx
        .repo
        .find_for(Collection::Users, identity.tenant_id, identity.user_id)
        .and_then(|u| u.get("employee_id"))
        .and_then(Value::as_i64);
    let Some(employee_id) = from_body.or(from_user) else {
        bail_api!(bad_request, "No employee profile linked to this user");
    };
    ctx.repo
        .find_for(Collection::Employees, identity.tenant_id, employee_id)
        .cloned()
        .ok_or_else(|| not_found("Employee"))
}

fn todays_record(ctx: &HandlerCtx<'_>, identity: &TenantContext, employee_id: i64) -> Option<Record> {
    let today = ctx.today();
    ctx.repo
        .for_tenant(Collection::Attendance, identity.tenant_id)
        .into_iter()
        .find(|r| {
            r.get("employee_id").and_then(Value::as_i64) == Some(employee_id)
                && field_equals(r, "date", &today)
        })
        .cloned()
}

pub fn check_in(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let employee = linked_employee(ctx, &identity)?;
    let employee_id = employee.get("id").and_then(Value::as_i64).unwrap_or_default();

    if let Some(existing) = todays_record(ctx, &identity, employee_id) {
        if existing.get("check_in").is_some_and(|v| !v.is_null()) {
            bail_api!(bad_request, "Already checked in today");
        }
    }

    let record = json!({
        "company_id": identity.tenant_id.0,
        "employee_id": employee_id,
        "employee_name": full_name(&employee),
        "date": ctx.today(),
        "check_in": ctx.now.format("%H:%M").to_string(),
        "check_out": null,
        "hours": 0.0,
        "status": "present",
        "created_at": ctx.timestamp(),
    });
    let record = ctx.repo.prepend(Collection::Attendance, record);
    info!(employee_id, tenant = %identity.tenant_id, "checked in");
    Ok(Reply::new(
        StatusCode::CREATED,
        Body::message("Checked in successfully", record),
    ))
}

pub fn check_out(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let employee = linked_employee(ctx, &identity)?;
    let employee_id = employee.get("id").and_then(Value::as_i64).unwrap_or_default();

    let open = todays_record(ctx, &identity, employee_id)
        .filter(|r| r.get("check_out").map_or(true, Value::is_null));
    let Some(open) = open else {
        bail_api!(bad_request, "No check-in found for today");
    };
    let id = open.get("id").and_then(Value::as_i64).unwrap_or_default();

    let check_out = ctx.now.format("%H:%M").to_string();
    let hours = open
        .get("check_in")
        .and_then(Value::as_str)
        .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
        .map(|start| {
            let minutes = (ctx.now.time() - start).num_minutes().max(0);
            (minutes as f64 / 60.0 * 100.0).round() / 100.0
        })
        .unwrap_or(0.0);

    let record = ctx
        .repo
        .update(Collection::Attendance, id, &json!({ "check_out": check_out, "hours": hours }))
        .ok_or_else(|| not_found("Attendance record"))?;
    info!(employee_id, tenant = %identity.tenant_id, hours, "checked out");
    Ok(Reply::message("Checked out successfully", record))
}

/// Children of a parent record, e.g. a project's tasks.
fn children(
    ctx: &mut HandlerCtx<'_>,
    parent: Resource,
    parent_id: i64,
    child: Resource,
    link: &str,
) -> anyhow::Result<Reply> {
    let Some(tenant) = ctx.tenant() else {
        return Ok(list_reply(ctx, child.list_key(), Vec::new()));
    };
    if ctx.repo.find_for(parent.collection(), tenant, parent_id).is_none() {
        return Err(not_found(parent.label()));
    }
    let wanted = parent_id.to_string();
    let items: Vec<Value> = filtered(ctx, child, tenant)
        .into_iter()
        .filter(|r| field_equals(r, link, &wanted))
        .collect();
    Ok(list_reply(ctx, child.list_key(), items))
}

pub fn project_tasks(ctx: &mut HandlerCtx<'_>, project_id: i64) -> anyhow::Result<Reply> {
    children(ctx, Resource::Projects, project_id, Resource::Tasks, "project_id")
}

pub fn job_candidates(ctx: &mut HandlerCtx<'_>, job_id: i64) -> anyhow::Result<Reply> {
    children(ctx, Resource::Jobs, job_id, Resource::Candidates, "job_id")
}

/// Set one enumerated field after checking it against `allowed`.
fn set_enum_field(
    ctx: &mut HandlerCtx<'_>,
    resource: Resource,
    id: i64,
    field: &str,
    allowed: &[&str],
) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let value = ctx.required_str(field)?;
    if !allowed.contains(&value.as_str()) {
        bail_api!(bad_request, "Invalid {}: {}", field, value);
    }
    let mut patch = Map::new();
    patch.insert(field.to_string(), Value::String(value));
    let record = ctx
        .repo
        .update_for(resource.collection(), identity.tenant_id, id, &Value::Object(patch))
        .ok_or_else(|| not_found(resource.label()))?;
    Ok(Reply::ok(record))
}

pub fn task_status(ctx: &mut HandlerCtx<'_>, task_id: i64) -> anyhow::Result<Reply> {
    set_enum_field(ctx, Resource::Tasks, task_id, "status", &TASK_STATUSES)
}

pub fn candidate_stage(ctx: &mut HandlerCtx<'_>, candidate_id: i64) -> anyhow::Result<Reply> {
    set_enum_field(ctx, Resource::Candidates, candidate_id, "stage", &CANDIDATE_STAGES)
}

pub fn assign_asset(ctx: &mut HandlerCtx<'_>, asset_id: i64) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let Some(employee_id) = ctx
        .request
        .body_i64("employee_id")
        .or_else(|| ctx.request.body_i64("assigned_to"))
    else {
        bail_api!(bad_request, "employee_id is required");
    };

    let employee = ctx
        .repo
        .find_for(Collection::Employees, identity.tenant_id, employee_id)
        .ok_or_else(|| not_found("Employee"))?;
    let employee_name = full_name(employee);

    let patch = json!({
        "status": "assigned",
        "assigned_to": employee_id,
        "assigned_to_name": employee_name,
        "assigned_at": ctx.timestamp(),
    });
    let record = ctx
        .repo
        .update_for(Collection::Assets, identity.tenant_id, asset_id, &patch)
        .ok_or_else(|| not_found(Resource::Assets.label()))?;
    info!(asset_id, employee_id, tenant = %identity.tenant_id, "asset assigned");
    Ok(Reply::ok(record))
}

pub fn ticket_comment(ctx: &mut HandlerCtx<'_>, ticket_id: i64) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let Some(message) = ctx
        .request
        .body_str("message")
        .or_else(|| ctx.request.body_str("comment"))
        .map(str::trim)
        .filter(|m| !m.is_empty())
    else {
        bail_api!(bad_request, "message is required");
    };

    if ctx
        .repo
        .find_for(Collection::Tickets, identity.tenant_id, ticket_id)
        .is_none()
    {
        return Err(not_found(Resource::Tickets.label()));
    }

    let author = ctx
        .repo
        .find_for(Collection::Users, identity.tenant_id, identity.user_id)
        .and_then(full_name)
        .unwrap_or_else(|| identity.email.clone());
    let created_at = ctx.timestamp();

    let record = ctx
        .repo
        .modify(Collection::Tickets, ticket_id, |ticket| {
            let mut comments = match ticket.get("comments") {
                Some(Value::Array(existing)) => existing.clone(),
                _ => Vec::new(),
            };
            comments.push(json!({
                "id": next_id(&comments),
                "user_id": identity.user_id,
                "author": author,
                "message": message,
                "created_at": created_at,
            }));
            ticket["comments"] = Value::Array(comments);
        })
        .ok_or_else(|| ApiError::not_found("Ticket not found").into_anyhow())?;
    Ok(Reply::new(StatusCode::CREATED, Body::success(record)))
}
