//! Path-pattern router.
//!
//! Templates are `/`-delimited; a segment starting with `:` captures, every
//! other segment must match literally. Matching is anchored on the whole
//! path. There are no wildcards, optional segments or regex segments.
//!
//! ```rust
//! use http::Method;
//! use loopback_core::Router;
//!
//! let mut router = Router::new();
//! router.add(Method::GET, "/hr/employees", "list").unwrap();
//! router.add(Method::PUT, "/hr/employees/:id", "update").unwrap();
//!
//! let (route, params) = router.resolve(&Method::PUT, "/hr/employees/42").unwrap();
//! assert_eq!(*route, "update");
//! assert_eq!(params.get("id"), Some("42"));
//! ```

use std::collections::HashMap;

use http::Method;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("route template `{0}` must start with `/`")]
    MissingLeadingSlash(String),

    #[error("route template `{0}` has an unnamed capture")]
    EmptyCapture(String),

    #[error("route template `{template}` captures `{name}` twice")]
    DuplicateCapture { template: String, name: String },

    #[error("path parameter `{0}` is not captured by this route")]
    MissingParam(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.trim_matches('/');
    trimmed.split('/').filter(move |_| !trimmed.is_empty())
}

/// `/a/b/` and `a/b` both become `/a/b`.
pub fn canonical_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for seg in split_segments(path) {
        out.push('/');
        out.push_str(seg);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

impl Pattern {
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        if !template.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(template.to_string()));
        }

        let mut segments = Vec::new();
        for seg in split_segments(template) {
            match seg.strip_prefix(':') {
                Some("") => return Err(PatternError::EmptyCapture(template.to_string())),
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Capture(n) if n == name));
                    if duplicate {
                        return Err(PatternError::DuplicateCapture {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Capture(name.to_string()));
                }
                None => segments.push(Segment::Literal(seg.to_string())),
            }
        }

        Ok(Self {
            template: canonical_path(template),
            segments,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// True when the template has no capture segments.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Capture names in declared order.
    pub fn captures(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Anchored structural match. Returns the captured values in declared
    /// order, or `None` when the path has a different shape.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut parts = split_segments(path);

        for seg in &self.segments {
            let part = parts.next()?;
            match seg {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push(name.clone(), part.to_string());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Values captured from a path, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`PathParams::get`] but an absent capture is an error.
    pub fn require(&self, name: &str) -> Result<&str, PatternError> {
        self.get(name)
            .ok_or_else(|| PatternError::MissingParam(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

struct Route<T> {
    method: Method,
    pattern: Pattern,
    value: T,
}

/// Resolves `(method, path)` to a registered value.
///
/// Literal templates are looked up directly; templated routes are tried in
/// registration order and the first structural match wins.
pub struct Router<T> {
    exact: HashMap<(Method, String), usize>,
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            routes: Vec::new(),
        }
    }

    pub fn add(&mut self, method: Method, template: &str, value: T) -> Result<&mut Self, PatternError> {
        let pattern = Pattern::compile(template)?;
        let index = self.routes.len();

        if pattern.is_literal() {
            let key = (method.clone(), pattern.template().to_string());
            if self.exact.contains_key(&key) {
                tracing::warn!(%method, template = pattern.template(), "duplicate route ignored");
                return Ok(self);
            }
            self.exact.insert(key, index);
        }

        self.routes.push(Route {
            method,
            pattern,
            value,
        });
        Ok(self)
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<(&T, PathParams)> {
        let canonical = canonical_path(path);
        if let Some(&index) = self.exact.get(&(method.clone(), canonical)) {
            return self
                .routes
                .get(index)
                .map(|r| (&r.value, PathParams::default()));
        }

        self.routes
            .iter()
            .filter(|r| r.method == *method && !r.pattern.is_literal())
            .find_map(|r| r.pattern.matches(path).map(|params| (&r.value, params)))
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &Pattern, &T)> {
        self.routes.iter().map(|r| (&r.method, &r.pattern, &r.value))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_come_back_in_declared_order() {
        let p = Pattern::compile("/companies/:company/users/:user/roles/:role").unwrap();
        let params = p.matches("/companies/7/users/42/roles/admin").unwrap();
        let got: Vec<_> = params.iter().collect();
        assert_eq!(got, vec![("company", "7"), ("user", "42"), ("role", "admin")]);
        assert_eq!(p.captures().collect::<Vec<_>>(), vec!["company", "user", "role"]);
    }

    #[test]
    fn segment_count_mismatch_never_matches() {
        let p = Pattern::compile("/hr/leaves/:id/approve").unwrap();
        assert!(p.matches("/hr/leaves/3").is_none());
        assert!(p.matches("/hr/leaves/3/approve/now").is_none());
        assert!(p.matches("/hr/leaves/3/approve").is_some());
    }

    #[test]
    fn literals_must_match_exactly() {
        let p = Pattern::compile("/hr/leaves/:id/approve").unwrap();
        assert!(p.matches("/hr/leaves/3/reject").is_none());
        assert!(p.matches("/hr/Leaves/3/approve").is_none());
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        let p = Pattern::compile("/tasks/:id/").unwrap();
        assert_eq!(p.template(), "/tasks/:id");
        assert_eq!(p.matches("/tasks/9/").unwrap().get("id"), Some("9"));
    }

    #[test]
    fn bad_templates_are_rejected() {
        assert_eq!(
            Pattern::compile("tasks"),
            Err(PatternError::MissingLeadingSlash("tasks".into()))
        );
        assert!(matches!(Pattern::compile("/tasks/:"), Err(PatternError::EmptyCapture(_))));
        assert!(matches!(
            Pattern::compile("/a/:id/b/:id"),
            Err(PatternError::DuplicateCapture { .. })
        ));
    }

    #[test]
    fn exact_routes_win_over_templates() {
        let mut router = Router::new();
        router
            .add(Method::PATCH, "/dashboard/notifications/:id", "one")
            .unwrap()
            .add(Method::PATCH, "/dashboard/notifications/read-all", "all")
            .unwrap();

        let (v, params) = router
            .resolve(&Method::PATCH, "/dashboard/notifications/read-all")
            .unwrap();
        assert_eq!(*v, "all");
        assert!(params.is_empty());

        let (v, params) = router.resolve(&Method::PATCH, "/dashboard/notifications/5").unwrap();
        assert_eq!(*v, "one");
        assert_eq!(params.get("id"), Some("5"));
    }

    #[test]
    fn first_registered_template_wins() {
        let mut router = Router::new();
        router.add(Method::GET, "/items/:id", "first").unwrap();
        router.add(Method::GET, "/items/:slug", "second").unwrap();
        let (v, _) = router.resolve(&Method::GET, "/items/x").unwrap();
        assert_eq!(*v, "first");
    }

    #[test]
    fn method_is_part_of_the_key() {
        let mut router = Router::new();
        router.add(Method::GET, "/hr/employees", 1).unwrap();
        assert!(router.resolve(&Method::POST, "/hr/employees").is_none());
        assert!(router.resolve(&Method::GET, "/hr/employees/").is_some());
        assert!(router.resolve(&Method::GET, "/hr/unknown").is_none());
    }
}
