//! Generic list/create/get/update/delete over a [`Resource`].

use chrono::NaiveDate;
use http::StatusCode;
use loopback_core::{Body, TenantId};
use loopback_store::query::{field_equals, matches_search, shallow_merge, PROTECTED_FIELDS};
use loopback_store::{Collection, Record, Repository};
use serde_json::{json, Value};
use tracing::debug;

use super::full_name;
use crate::context::{not_found, HandlerCtx, Reply};
use crate::endpoint::Resource;

/// Tenant records of `resource` matching the request's filters and search.
pub(crate) fn filtered(ctx: &HandlerCtx<'_>, resource: Resource, tenant: TenantId) -> Vec<Value> {
    let filters: Vec<(&str, &str)> = resource
        .filters()
        .iter()
        .filter_map(|f| ctx.request.query(f).map(|v| (*f, v)))
        .collect();
    let search = ctx
        .request
        .query("search")
        .or_else(|| ctx.request.query("q"));

    ctx.repo
        .for_tenant(resource.collection(), tenant)
        .into_iter()
        .filter(|r| filters.iter().all(|(f, v)| field_equals(r, f, v)))
        .filter(|r| search.map_or(true, |s| matches_search(r, resource.search_fields(), s)))
        .cloned()
        .collect()
}

/// Apply optional pagination and wrap as a list reply.
pub(crate) fn list_reply(ctx: &HandlerCtx<'_>, key: &str, items: Vec<Value>) -> Reply {
    let pagination = ctx.pagination(items.len());
    let items = match pagination {
        Some(p) => p.slice(items),
        None => items,
    };
    Reply::list(key, items, pagination)
}

pub fn list(ctx: &mut HandlerCtx<'_>, resource: Resource) -> anyhow::Result<Reply> {
    let items = match ctx.tenant() {
        Some(tenant) => filtered(ctx, resource, tenant),
        None => Vec::new(),
    };
    Ok(list_reply(ctx, resource.list_key(), items))
}

pub fn get(ctx: &mut HandlerCtx<'_>, resource: Resource, id: i64) -> anyhow::Result<Reply> {
    let record = ctx
        .tenant()
        .and_then(|t| ctx.repo.find_for(resource.collection(), t, id))
        .ok_or_else(|| not_found(resource.label()))?;
    Ok(Reply::ok(record.clone()))
}

pub fn create(ctx: &mut HandlerCtx<'_>, resource: Resource) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let body = Value::Object(ctx.body_object()?.clone());

    let mut record = resource.defaults();
    shallow_merge(&mut record, &body, &PROTECTED_FIELDS);
    record["company_id"] = json!(identity.tenant_id.0);
    record["created_at"] = json!(ctx.timestamp());
    enrich(ctx.repo, resource, identity.tenant_id, &mut record);
    if resource == Resource::Tickets && record.get("requester_id").is_none() {
        record["requester_id"] = json!(identity.user_id);
    }

    let collection = resource.collection();
    let record = if resource.prepends() {
        ctx.repo.prepend(collection, record)
    } else {
        ctx.repo.add(collection, record)
    };
    debug!(%collection, id = ?record.get("id"), tenant = %identity.tenant_id, "created");
    Ok(Reply::new(StatusCode::CREATED, Body::success(record)))
}

pub fn update(ctx: &mut HandlerCtx<'_>, resource: Resource, id: i64) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let mut partial = Value::Object(ctx.body_object()?.clone());
    enrich(ctx.repo, resource, identity.tenant_id, &mut partial);

    let record = ctx
        .repo
        .update_for(resource.collection(), identity.tenant_id, id, &partial)
        .ok_or_else(|| not_found(resource.label()))?;
    Ok(Reply::ok(record))
}

pub fn delete(ctx: &mut HandlerCtx<'_>, resource: Resource, id: i64) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    if !ctx.repo.remove_for(resource.collection(), identity.tenant_id, id) {
        return Err(not_found(resource.label()));
    }
    Ok(Reply::message(
        format!("{} deleted successfully", resource.label()),
        json!({ "id": id }),
    ))
}

/// Derived fields: `employee_name` from `employee_id`, leave `days` from
/// the date range. Only fills what the caller did not send.
fn enrich(repo: &Repository, resource: Resource, tenant: TenantId, record: &mut Record) {
    let has_employee = matches!(
        resource,
        Resource::Leaves | Resource::Attendance | Resource::Expenses | Resource::Reviews
    );
    if has_employee && record.get("employee_name").is_none() {
        let name = record
            .get("employee_id")
            .and_then(Value::as_i64)
            .and_then(|id| repo.find_for(Collection::Employees, tenant, id))
            .and_then(full_name);
        if let Some(name) = name {
            record["employee_name"] = json!(name);
        }
    }

    if resource == Resource::Leaves && record.get("days").is_none() {
        let date = |field: &str| {
            record
                .get(field)
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        };
        if let (Some(start), Some(end)) = (date("start_date"), date("end_date")) {
            let days = (end - start).num_days() + 1;
            if days > 0 {
                record["days"] = json!(days);
            }
        }
    }
}
