use std::collections::HashMap;

const SCHEMES: &[&str] = &["Bearer", "JWT"];

/// Pull the token out of an `Authorization: <scheme> <token>` header.
///
/// Header names are matched case-insensitively, as is the scheme.
pub fn extract_bearer_token(headers: &HashMap<String, String>) -> Option<String> {
    let value = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .or_else(|| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
                .map(|(_, v)| v)
        })?;

    let value = value.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    SCHEMES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(scheme.trim()))
        .then(|| token.to_string())
}
