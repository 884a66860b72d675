use http::StatusCode;
use loopback_auth::{hash_password, verify_password, TokenPair, TokenSubject};
use loopback_core::{bail_api, ApiError, Body, TenantId};
use loopback_store::seed::{company_settings, MODULES};
use loopback_store::{Collection, Record, Repository};
use serde_json::{json, Map, Value};
use tracing::info;

use super::{full_name, public_user};
use crate::context::{HandlerCtx, Reply};

const MIN_PASSWORD_LEN: usize = 6;

/// Profile fields a user may not change about themselves.
const PROFILE_LOCKED: [&str; 4] = ["password", "role", "modules", "employee_id"];

pub(crate) fn find_by_email<'r>(repo: &'r Repository, email: &str) -> Option<&'r Record> {
    repo.get(Collection::Users).iter().find(|u| {
        u.get("email")
            .and_then(Value::as_str)
            .is_some_and(|e| e.eq_ignore_ascii_case(email))
    })
}

fn subject_of(user: &Record) -> anyhow::Result<TokenSubject> {
    let field = |name: &str| user.get(name).cloned().unwrap_or(Value::Null);
    match (
        field("id").as_i64(),
        field("email").as_str(),
        field("company_id").as_i64(),
        field("role").as_str(),
    ) {
        (Some(id), Some(email), Some(company_id), Some(role)) => Ok(TokenSubject {
            id,
            email: email.to_string(),
            company_id,
            role: role.to_string(),
        }),
        _ => anyhow::bail!("User record {} is incomplete", field("id")),
    }
}

fn session(ctx: &HandlerCtx<'_>, user: &Record, pair: TokenPair) -> Value {
    let company = TenantId::of(user)
        .and_then(|t| ctx.repo.find(Collection::Companies, t.0))
        .cloned()
        .unwrap_or(Value::Null);
    json!({
        "user": public_user(user),
        "company": company,
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    })
}

fn check_new_password(password: &str) -> anyhow::Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail_api!(bad_request, "Password must be at least {} characters", MIN_PASSWORD_LEN);
    }
    Ok(())
}

pub fn login(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let (Some(email), Some(password)) = (ctx.request.body_str("email"), ctx.request.body_str("password")) else {
        bail_api!(bad_request, "Email and password are required");
    };

    let user = find_by_email(ctx.repo, email.trim())
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("User not found").into_anyhow())?;

    let stored = user.get("password").and_then(Value::as_str).unwrap_or("");
    if !verify_password(stored, password) {
        bail_api!(unauthorized, "Invalid password");
    }

    let subject = subject_of(&user)?;
    let pair = ctx.tokens.issue(&subject)?;
    info!(user_id = subject.id, tenant = subject.company_id, "login");
    Ok(Reply::new(
        StatusCode::OK,
        Body::message("Login successful", session(ctx, &user, pair)),
    ))
}

pub fn register(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let email = ctx.required_str("email")?;
    let password = ctx.required_str("password")?;
    let first_name = ctx.required_str("first_name")?;
    let last_name = ctx.required_str("last_name")?;
    let company_name = ctx.required_str("company_name")?;

    if !email.contains('@') {
        bail_api!(bad_request, "Invalid email address");
    }
    check_new_password(&password)?;
    if find_by_email(ctx.repo, &email).is_some() {
        bail_api!(conflict, "Email already registered");
    }

    let now = ctx.timestamp();
    let hash = hash_password(&password, ctx.tokens.options().password_cost)?;
    let industry = ctx.request.body.get("industry").cloned().unwrap_or(Value::Null);

    let company_id = ctx.repo.next_id(Collection::Companies);
    ctx.repo.add(
        Collection::Companies,
        json!({
            "id": company_id, "company_id": company_id, "name": company_name,
            "industry": industry, "created_at": now,
        }),
    );
    ctx.repo.put_settings(
        TenantId(company_id),
        company_settings(&company_name, "UTC", "USD", &MODULES),
    );

    let user = ctx.repo.add(
        Collection::Users,
        json!({
            "email": email, "password": hash,
            "first_name": first_name, "last_name": last_name,
            "company_id": company_id, "role": "admin", "employee_id": null,
            "modules": MODULES, "created_at": now,
        }),
    );

    let subject = subject_of(&user)?;
    let pair = ctx.tokens.issue(&subject)?;
    info!(user_id = subject.id, tenant = company_id, "registered new company");
    Ok(Reply::new(
        StatusCode::CREATED,
        Body::message("Registration successful", session(ctx, &user, pair)),
    ))
}

pub fn refresh(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let Some(token) = ctx
        .request
        .body_str("refreshToken")
        .or_else(|| ctx.request.body_str("refresh_token"))
    else {
        bail_api!(bad_request, "Refresh token is required");
    };

    let claims = ctx
        .tokens
        .verify_refresh(token)
        .map_err(|e| ApiError::unauthorized("Invalid refresh token").with_source(e.into()).into_anyhow())?;

    let user = ctx
        .repo
        .find_for(Collection::Users, TenantId(claims.tenant), claims.sub)
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("User not found").into_anyhow())?;

    let pair = ctx.tokens.issue(&subject_of(&user)?)?;
    Ok(Reply::ok(json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    })))
}

pub fn me(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let user = ctx
        .repo
        .find_for(Collection::Users, identity.tenant_id, identity.user_id)
        .ok_or_else(|| ApiError::not_found("User not found").into_anyhow())?;
    let company = ctx
        .repo
        .find(Collection::Companies, identity.tenant_id.0)
        .cloned()
        .unwrap_or(Value::Null);
    Ok(Reply::ok(json!({ "user": public_user(user), "company": company })))
}

/// Tokens are stateless, so there is nothing to revoke.
pub fn logout(_ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    Ok(Reply::message("Logged out successfully", Value::Null))
}

pub fn update_profile(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let partial: Map<String, Value> = ctx
        .body_object()?
        .iter()
        .filter(|(k, _)| !PROFILE_LOCKED.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(email) = partial.get("email").and_then(Value::as_str) {
        let taken = find_by_email(ctx.repo, email)
            .and_then(|u| u.get("id").and_then(Value::as_i64))
            .is_some_and(|id| id != identity.user_id);
        if taken {
            bail_api!(conflict, "Email already registered");
        }
    }

    let user = ctx
        .repo
        .update_for(Collection::Users, identity.tenant_id, identity.user_id, &Value::Object(partial))
        .ok_or_else(|| ApiError::not_found("User not found").into_anyhow())?;
    info!(user_id = identity.user_id, name = ?full_name(&user), "profile updated");
    Ok(Reply::message("Profile updated successfully", public_user(&user)))
}

pub fn change_password(ctx: &mut HandlerCtx<'_>) -> anyhow::Result<Reply> {
    let identity = ctx.require_identity()?;
    let current = ctx.required_str("current_password")?;
    let next = ctx.required_str("new_password")?;

    let user = ctx
        .repo
        .find_for(Collection::Users, identity.tenant_id, identity.user_id)
        .ok_or_else(|| ApiError::not_found("User not found").into_anyhow())?;
    let stored = user.get("password").and_then(Value::as_str).unwrap_or("");
    if !verify_password(stored, &current) {
        bail_api!(bad_request, "Current password is incorrect");
    }
    check_new_password(&next)?;

    let hash = hash_password(&next, ctx.tokens.options().password_cost)?;
    ctx.repo.modify(Collection::Users, identity.user_id, |u| {
        u["password"] = Value::String(hash);
    });
    info!(user_id = identity.user_id, "password changed");
    Ok(Reply::message("Password changed successfully", Value::Null))
}
