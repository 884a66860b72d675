use loopback_store::query::shallow_merge;
use loopback_store::seed::MODULES;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::context::{HandlerCtx, Reply};

pub fn company(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let settings = ctx
        .tenant()
        .and_then(|t| ctx.repo.settings(t))
        .cloned()
        .unwrap_or(Value::Null);
    Ok(Reply::ok(settings))
}

pub fn update_company(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let admin = ctx.require_admin()?;
    let partial = Value::Object(ctx.body_object()?.clone());

    let mut settings = ctx
        .repo
        .settings(admin.tenant_id)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    shallow_merge(&mut settings, &partial, &[]);
    let settings = ctx.repo.put_settings(admin.tenant_id, settings);
    info!(tenant = %admin.tenant_id, by = admin.user_id, "company settings updated");
    Ok(Reply::message("Settings updated successfully", settings))
}

/// Module switches of the caller's company. Unknown tenants see every
/// module switched off.
pub fn modules(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let switches = ctx
        .tenant()
        .and_then(|t| ctx.repo.settings(t))
        .and_then(|s| s.get("modules"))
        .and_then(Value::as_object);
    let modules: Map<String, Value> = MODULES
        .iter()
        .map(|m| {
            let on = switches
                .and_then(|s| s.get(*m))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            (m.to_string(), Value::Bool(on))
        })
        .collect();
    let enabled: Vec<&str> = MODULES
        .iter()
        .copied()
        .filter(|m| modules.get(*m) == Some(&Value::Bool(true)))
        .collect();
    Ok(Reply::ok(json!({ "modules": modules, "enabled": enabled })))
}
