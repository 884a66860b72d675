use std::time::Duration;

use loopback_auth::{AuthError, TokenOptions, TokenService, TokenSubject, PLACEHOLDER_SIGNATURE};

const NOW: i64 = 1_760_000_000;

fn create_service() -> TokenService {
    TokenService::new(TokenOptions::default()).unwrap()
}

fn create_subject(id: i64, company_id: i64) -> TokenSubject {
    TokenSubject {
        id,
        email: format!("user{id}@example.com"),
        company_id,
        role: "hr_manager".to_string(),
    }
}

#[test]
fn verify_returns_subject_and_tenant_of_issued_token() {
    let svc = create_service();
    for (id, tenant) in [(1, 101), (7, 202), (42, 303)] {
        let pair = svc.issue_at(&create_subject(id, tenant), NOW).unwrap();
        let claims = svc.verify_at(&pair.access_token, NOW + 60).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.tenant, tenant);
        assert_eq!(claims.role, "hr_manager");
        assert_eq!(claims.iss, "loopback");
        assert_eq!(claims.iat, NOW);
    }
}

#[test]
fn token_has_three_segments_and_placeholder_signature() {
    let svc = create_service();
    let pair = svc.issue_at(&create_subject(1, 101), NOW).unwrap();
    let parts: Vec<&str> = pair.access_token.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2], PLACEHOLDER_SIGNATURE);
    assert!(!pair.access_token.contains('='));
}

#[test]
fn expired_access_token_is_refused() {
    let svc = create_service();
    let pair = svc.issue_at(&create_subject(1, 101), NOW).unwrap();

    let last_valid = NOW + 86_400;
    assert!(svc.verify_at(&pair.access_token, last_valid).is_some());
    assert!(svc.verify_at(&pair.access_token, last_valid + 1).is_none());
    assert!(matches!(
        svc.check_at(&pair.access_token, last_valid + 1),
        Err(AuthError::Expired { .. })
    ));

    // refresh outlives access
    assert!(svc.verify_at(&pair.refresh_token, last_valid + 1).is_some());
}

#[test]
fn refresh_requires_refresh_kind() {
    let svc = create_service();
    let pair = svc.issue_at(&create_subject(3, 101), NOW).unwrap();

    let refreshed = svc.verify_refresh_at(&pair.refresh_token, NOW + 1).unwrap();
    assert_eq!(refreshed.sub, 3);

    let err = svc.verify_refresh_at(&pair.access_token, NOW + 1).unwrap_err();
    assert!(matches!(err, AuthError::WrongKind { expected: "refresh" }));
}

#[test]
fn malformed_tokens_are_refused() {
    let svc = create_service();
    for token in ["", "abc", "a.b", "a.b.c.d", "!!!.@@@.###", "eyJhbGciOiJub25lIn0.e30.sig"] {
        assert!(svc.verify_at(token, NOW).is_none(), "{token:?}");
    }
}

#[test]
fn configured_lifetimes_are_applied() {
    let svc = TokenService::new(
        TokenOptions::default()
            .with_issuer("hr-sim")
            .with_access_ttl(Duration::from_secs(60))
            .with_refresh_ttl(Duration::from_secs(120)),
    )
    .unwrap();
    let pair = svc.issue_at(&create_subject(1, 101), NOW).unwrap();
    let access = svc.decode(&pair.access_token).unwrap();
    let refresh = svc.decode(&pair.refresh_token).unwrap();
    assert_eq!(access.exp - access.iat, 60);
    assert_eq!(refresh.exp - refresh.iat, 120);
    assert_eq!(access.iss, "hr-sim");
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
#[test]
fn hs256_tokens_reject_a_foreign_secret() {
    let a = TokenService::new(TokenOptions::default().hs256("first-secret")).unwrap();
    let b = TokenService::new(TokenOptions::default().hs256("second-secret")).unwrap();
    let pair = a.issue_at(&create_subject(1, 101), NOW).unwrap();

    assert_eq!(a.algorithm(), "HS256");
    assert!(a.verify_at(&pair.access_token, NOW).is_some());
    assert!(b.verify_at(&pair.access_token, NOW).is_none());
}
