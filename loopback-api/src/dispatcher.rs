//! Request dispatch: normalize the path, resolve a route, bind the endpoint,
//! run the handler and turn whatever comes back into a response envelope.

use chrono::Utc;
use http::StatusCode;
use loopback_auth::{extract_bearer_token, TokenService};
use loopback_core::{ApiError, ApiRequest, Body, ResponseEnvelope, Router, TenantContext};
use loopback_store::{Repository, StoreSnapshot};
use tracing::{debug, error, warn};

use crate::config::SimConfig;
use crate::context::HandlerCtx;
use crate::endpoint::{route_table, Endpoint, RouteKey};
use crate::handlers;

pub struct Dispatcher {
    router: Router<RouteKey>,
    repo: Repository,
    tokens: TokenService,
    config: SimConfig,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("repo", &self.repo)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl Dispatcher {
    /// Build the route table around an already loaded repository.
    pub fn new(config: SimConfig, repo: Repository, tokens: TokenService) -> anyhow::Result<Self> {
        let mut router = Router::new();
        for (method, template, key) in route_table() {
            router.add(method, &template, key)?;
        }
        debug!(routes = router.len(), base = %config.base_path, "dispatcher ready");
        Ok(Self {
            router,
            repo,
            tokens,
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn reset(&mut self) {
        self.repo.reset();
    }

    pub fn shutdown(&mut self) {
        self.repo.shutdown();
    }

    pub fn dump(&self) -> StoreSnapshot {
        self.repo.dump()
    }

    /// Strip the configured API base and any trailing slash from a request
    /// path. Scheme, host, query and fragment are already gone.
    pub fn normalize_path(&self, raw: &str) -> String {
        let mut path = raw;
        let base = self.config.base_path.as_str();
        if !base.is_empty() {
            if let Some(rest) = path.strip_prefix(base) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest;
                }
            }
        }

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    fn identify(&self, request: &ApiRequest) -> Option<TenantContext> {
        let token = extract_bearer_token(&request.headers)?;
        let claims = self.tokens.verify(&token)?;
        Some(TenantContext::new(claims.tenant, claims.sub, claims.email, claims.role))
    }

    pub fn dispatch(&mut self, request: &ApiRequest) -> ResponseEnvelope {
        let path = self.normalize_path(&request.path);
        debug!(method = %request.method, %path, "dispatch");

        let Some((key, params)) = self.router.resolve(&request.method, &path) else {
            return self.unmatched(request, &path);
        };
        let key = *key;

        let endpoint = match Endpoint::bind(key, &params) {
            Ok(endpoint) => endpoint,
            Err(e) => return failure(e),
        };

        let identity = self.identify(request);
        if identity.is_none() && endpoint.requires_identity() {
            return failure(ApiError::unauthorized("Unauthorized"));
        }

        let mut ctx = HandlerCtx {
            request,
            identity,
            repo: &mut self.repo,
            tokens: &self.tokens,
            config: &self.config,
            now: Utc::now(),
        };

        match handlers::handle(&endpoint, &mut ctx) {
            Ok(reply) => ResponseEnvelope::new(reply.status, reply.body),
            Err(e) => {
                let api = ApiError::normalize(e);
                if api.status().is_server_error() {
                    error!(method = %request.method, %path, error = %api, "handler failed");
                } else {
                    debug!(method = %request.method, %path, status = api.code(), message = %api.message, "request refused");
                }
                failure(api)
            }
        }
    }

    fn unmatched(&self, request: &ApiRequest, path: &str) -> ResponseEnvelope {
        if self.config.strict_routes {
            warn!(method = %request.method, %path, "no route matched");
            return failure(ApiError::not_found("Route not found"));
        }
        warn!(method = %request.method, %path, "no route matched, answering with the default body");
        ResponseEnvelope::new(StatusCode::OK, Body::fallback())
    }
}

fn failure(err: ApiError) -> ResponseEnvelope {
    ResponseEnvelope::new(err.status(), err.to_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopback_auth::TokenOptions;
    use loopback_store::{MemoryStorage, DEFAULT_STORAGE_KEY};
    use std::sync::Arc;

    fn dispatcher(config: SimConfig) -> Dispatcher {
        let repo = Repository::open(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY);
        let tokens = TokenService::new(TokenOptions::default()).unwrap();
        Dispatcher::new(config, repo, tokens).unwrap()
    }

    #[test]
    fn normalize_strips_host_base_and_trailing_slash() {
        let d = dispatcher(SimConfig::default());
        let path = |url: &str| {
            let req = ApiRequest::from_descriptor(loopback_core::RequestDescriptor::get(url)).unwrap();
            d.normalize_path(&req.path)
        };
        assert_eq!(path("/api/v1/hr/employees/"), "/hr/employees");
        assert_eq!(path("http://localhost:5000/api/v1/projects?page=2"), "/projects");
        assert_eq!(path("/api/v1/projects#board"), "/projects");
        assert_eq!(path("/api/v1"), "/");
        assert_eq!(path("/api/v10/x"), "/api/v10/x");
        assert_eq!(path("tasks"), "/tasks");
    }

    #[test]
    fn unmatched_routes_are_permissive_unless_strict() {
        let req = ApiRequest::from_descriptor(loopback_core::RequestDescriptor::get("/api/v1/nope")).unwrap();

        let mut lax = dispatcher(SimConfig::default());
        let res = lax.dispatch(&req);
        assert_eq!(res.status, 200);
        assert_eq!(res.data, Body::fallback());

        let mut strict = dispatcher(SimConfig::default().strict());
        let res = strict.dispatch(&req);
        assert_eq!(res.status, 404);
        assert_eq!(res.message(), Some("Route not found"));
    }

    /// A token naming a user from another company resolves to no user record.
    #[test]
    fn user_lookups_stay_inside_the_token_tenant() {
        let mut d = dispatcher(SimConfig::default());
        let foreign = d
            .tokens
            .issue(&loopback_auth::TokenSubject {
                id: 5,
                email: "admin@globex.com".into(),
                company_id: 101,
                role: "admin".into(),
            })
            .unwrap()
            .access_token;

        let comment = loopback_core::RequestDescriptor::post(
            "/api/v1/helpdesk/tickets/1/comments",
            serde_json::json!({ "message": "Rebooted the router" }),
        )
        .bearer(&foreign);
        let res = d.dispatch(&ApiRequest::from_descriptor(comment).unwrap());
        assert_eq!(res.status, 201);
        assert_eq!(res.payload()["comments"][0]["author"], "admin@globex.com");

        let promote = loopback_core::RequestDescriptor::put(
            "/api/v1/users/4/role",
            serde_json::json!({ "role": "admin" }),
        )
        .bearer(&foreign);
        let res = d.dispatch(&ApiRequest::from_descriptor(promote).unwrap());
        assert_eq!(res.status, 403);
        assert_eq!(res.message(), Some("Insufficient permissions"));
    }
}
