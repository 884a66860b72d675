//! Dashboard counters, chart series and the caller's notifications.

use std::collections::BTreeMap;

use loopback_core::{TenantContext, TenantId};
use loopback_store::query::field_equals;
use loopback_store::{Collection, Record, Repository};
use serde_json::{json, Value};
use tracing::debug;

use crate::context::{not_found, HandlerCtx, Reply};

fn count(repo: &Repository, collection: Collection, tenant: TenantId, statuses: &[&str]) -> usize {
    repo.for_tenant(collection, tenant)
        .into_iter()
        .filter(|r| statuses.is_empty() || statuses.iter().any(|s| field_equals(r, "status", s)))
        .count()
}

fn department_distribution(repo: &Repository, tenant: TenantId) -> Vec<Value> {
    let mut by_department: BTreeMap<String, usize> = BTreeMap::new();
    for employee in repo.for_tenant(Collection::Employees, tenant) {
        let name = employee
            .get("department")
            .and_then(Value::as_str)
            .unwrap_or("Unassigned");
        *by_department.entry(name.to_string()).or_default() += 1;
    }
    by_department
        .into_iter()
        .map(|(name, count)| json!({ "name": name, "value": count }))
        .collect()
}

pub fn stats(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let repo: &Repository = &*ctx.repo;
    let (counts, departments) = match ctx.tenant() {
        Some(t) => (
            json!({
                "total_employees": count(repo, Collection::Employees, t, &[]),
                "active_employees": count(repo, Collection::Employees, t, &["active"]),
                "departments": count(repo, Collection::Departments, t, &[]),
                "pending_leaves": count(repo, Collection::Leaves, t, &["pending"]),
                "active_projects": count(repo, Collection::Projects, t, &["planning", "in_progress"]),
                "open_tickets": count(repo, Collection::Tickets, t, &["open", "in_progress"]),
                "pending_expenses": count(repo, Collection::Expenses, t, &["pending"]),
                "open_jobs": count(repo, Collection::JobPostings, t, &["open"]),
                "candidates": count(repo, Collection::Candidates, t, &[]),
            }),
            department_distribution(repo, t),
        ),
        None => (
            json!({
                "total_employees": 0, "active_employees": 0, "departments": 0,
                "pending_leaves": 0, "active_projects": 0, "open_tickets": 0,
                "pending_expenses": 0, "open_jobs": 0, "candidates": 0,
            }),
            Vec::new(),
        ),
    };

    let charts = repo.dashboard();
    let series = |name: &str| charts.get(name).cloned().unwrap_or_else(|| json!([]));
    Ok(Reply::ok(json!({
        "stats": counts,
        "department_distribution": departments,
        "revenue": series("revenue"),
        "expenses": series("expenses"),
        "headcount": series("headcount"),
        "attendance_rate": series("attendance_rate"),
    })))
}

fn addressed_to(record: &Record, identity: &TenantContext) -> bool {
    identity.tenant_id.owns(record)
        && record.get("user_id").and_then(Value::as_i64) == Some(identity.user_id)
}

fn is_unread(record: &Record) -> bool {
    !record.get("read").and_then(Value::as_bool).unwrap_or(false)
}

pub fn notifications(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let Some(identity) = ctx.identity.as_ref() else {
        return Ok(Reply::ok(json!({ "notifications": [], "unread": 0 })));
    };
    let mine: Vec<Value> = ctx
        .repo
        .get(Collection::Notifications)
        .iter()
        .filter(|n| addressed_to(n, identity))
        .cloned()
        .collect();
    let unread = mine.iter().filter(|n| is_unread(n)).count();
    Ok(Reply::ok(json!({ "notifications": mine, "unread": unread })))
}

pub fn read_all(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let updated = ctx.repo.modify_where(
        Collection::Notifications,
        |n| addressed_to(n, &identity) && is_unread(n),
        |n| n["read"] = Value::Bool(true),
    );
    debug!(user_id = identity.user_id, updated, "notifications marked read");
    Ok(Reply::message(
        "All notifications marked as read",
        json!({ "updated": updated }),
    ))
}

pub fn read_one(ctx: &mut HandlerCtx<'_>, notification_id: i64) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let owned = ctx
        .repo
        .find_for(Collection::Notifications, identity.tenant_id, notification_id)
        .is_some_and(|n| addressed_to(n, &identity));
    if !owned {
        return Err(not_found("Notification"));
    }
    let record = ctx
        .repo
        .modify(Collection::Notifications, notification_id, |n| {
            n["read"] = Value::Bool(true)
        })
        .ok_or_else(|| not_found("Notification"))?;
    Ok(Reply::ok(record))
}
