use loopback_core::{bail_api, ApiError};
use loopback_store::query::{field_equals, matches_search};
use loopback_store::seed::MODULES;
use loopback_store::Collection;
use serde_json::{json, Value};
use tracing::info;

use super::public_user;
use crate::context::{HandlerCtx, Reply};

pub const ROLES: [&str; 4] = ["admin", "hr_manager", "manager", "employee"];

pub fn list(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let Some(tenant) = ctx.tenant() else {
        return Ok(Reply::list("users", Vec::new(), None));
    };
    let role = ctx.request.query("role");
    let search = ctx.request.query("search");

    let users: Vec<Value> = ctx
        .repo
        .for_tenant(Collection::Users, tenant)
        .into_iter()
        .filter(|u| role.map_or(true, |r| field_equals(u, "role", r)))
        .filter(|u| search.map_or(true, |s| matches_search(u, &["first_name", "last_name", "email"], s)))
        .map(public_user)
        .collect();

    let pagination = ctx.pagination(users.len());
    let users = match pagination {
        Some(p) => p.slice(users),
        None => users,
    };
    Ok(Reply::list("users", users, pagination))
}

pub fn update_role(ctx: &mut HandlerCtx<'_>, user_id: i64) -> anyhow::Result<Reply> {
    let admin = ctx.require_admin()?;
    let role = ctx.required_str("role")?;
    if !ROLES.contains(&role.as_str()) {
        bail_api!(bad_request, "Invalid role: {}", role);
    }
    if user_id == admin.user_id && role != "admin" {
        bail_api!(bad_request, "You cannot remove your own admin role");
    }

    let user = ctx
        .repo
        .update_for(Collection::Users, admin.tenant_id, user_id, &json!({ "role": role }))
        .ok_or_else(|| ApiError::not_found("User not found").into_anyhow())?;
    info!(user_id, %role, by = admin.user_id, "role changed");
    Ok(Reply::message("User role updated", public_user(&user)))
}

pub fn update_modules(ctx: &mut HandlerCtx<'_>, user_id: i64) -> anyhow::Result<Reply> {
    let admin = ctx.require_admin()?;
    let Some(requested) = ctx.request.body.get("modules").and_then(Value::as_array) else {
        bail_api!(bad_request, "modules must be an array");
    };

    let mut modules: Vec<String> = Vec::with_capacity(requested.len());
    for m in requested {
        match m.as_str() {
            Some(name) if MODULES.contains(&name) => {
                if !modules.iter().any(|have| have == name) {
                    modules.push(name.to_string());
                }
            }
            _ => bail_api!(bad_request, "Unknown module: {}", m),
        }
    }

    let user = ctx
        .repo
        .update_for(Collection::Users, admin.tenant_id, user_id, &json!({ "modules": modules }))
        .ok_or_else(|| ApiError::not_found("User not found").into_anyhow())?;
    info!(user_id, by = admin.user_id, "module grants changed");
    Ok(Reply::message("User modules updated", public_user(&user)))
}
