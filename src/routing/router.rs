//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Compile route declarations and store them by name
//! - Keep one matching tree per subdomain bucket
//! - Resolve (method, subdomain, path) into a dispatch outcome
//!
//! # Design Decisions
//! - Built single-threaded at boot, then shared read-only
//! - Subdomain buckets are tried exact, then wildcard, then root
//! - A non-match is a value, never an error, and is never logged above `trace`

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;
use thiserror::Error;

use super::matcher::{InsertError, RouteTree, TreeMatch};
use super::segment::{compile_path, CompileError, CompiledSegment};
use crate::registry::Macros;

/// Errors raised while registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route \"{route}\" failed to compile:\n{}", join(.errors))]
    Compile {
        route: String,
        errors: Vec<CompileError>,
    },

    #[error("route \"{route}\" is ambiguous with \"{existing}\": same method, subdomain and path")]
    Ambiguous { route: String, existing: String },

    #[error("route name \"{0}\" is already registered")]
    DuplicateName(String),

    #[error("route \"{route}\": parameter {param} is shadowed by catch-all {existing} at the same position")]
    ShadowedParameter {
        route: String,
        param: String,
        existing: String,
    },

    #[error("route \"{route}\": wildcard {param} conflicts with wildcard {existing} at the same position")]
    WildcardConflict {
        route: String,
        param: String,
        existing: String,
    },
}

fn join(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Host constraint of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subdomain {
    /// No constraint.
    None,
    /// One literal host label, lowercased.
    Exact(String),
    /// Any single label.
    Wildcard,
}

impl Subdomain {
    /// Parse a declaration such as `""`, `"admin"`, `"admin."` or `"*."`.
    pub fn parse(raw: &str) -> Self {
        let label = raw.trim().trim_end_matches('.');
        match label {
            "" => Subdomain::None,
            "*" => Subdomain::Wildcard,
            other => Subdomain::Exact(other.to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subdomain::None => Ok(()),
            Subdomain::Exact(label) => write!(f, "{label}."),
            Subdomain::Wildcard => f.write_str("*."),
        }
    }
}

/// A compiled route declaration.
#[derive(Debug)]
pub struct Route<H> {
    name: String,
    method: Method,
    subdomain: Subdomain,
    path: String,
    segments: Vec<CompiledSegment>,
    handler: H,
}

impl<H> Route<H> {
    /// Compile `path` against `macros`. An empty `name` defaults to the
    /// method, subdomain and path run together, e.g. `GETadmin./users`.
    pub fn compile(
        method: Method,
        subdomain: &str,
        path: &str,
        handler: H,
        name: &str,
        macros: &Macros,
    ) -> Result<Self, RouteError> {
        let subdomain = Subdomain::parse(subdomain);
        let name = if name.is_empty() {
            format!("{method}{subdomain}{path}")
        } else {
            name.to_string()
        };
        let segments = compile_path(path, macros).map_err(|errors| RouteError::Compile {
            route: name.clone(),
            errors,
        })?;
        Ok(Self {
            name,
            method,
            subdomain,
            path: path.to_string(),
            segments,
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn subdomain(&self) -> &Subdomain {
        &self.subdomain
    }

    /// The path as it was declared.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[CompiledSegment] {
        &self.segments
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Parameter names in path order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| s.param())
            .map(|p| p.name())
            .collect()
    }
}

/// Parameter values extracted by a match, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries.iter().cloned().collect()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// A successful match.
#[derive(Debug)]
pub struct RouteMatch<'r, H> {
    pub route: &'r Route<H>,
    pub params: Params,
    /// The request's subdomain label when a subdomain route matched.
    pub subdomain: Option<String>,
}

impl<'r, H> RouteMatch<'r, H> {
    pub fn handler(&self) -> &'r H {
        self.route.handler()
    }
}

/// Outcome of [`Router::dispatch`].
#[derive(Debug)]
pub enum Dispatch<'r, H> {
    Matched(RouteMatch<'r, H>),
    /// The path exists but not for this method.
    MethodNotAllowed { allowed: Vec<Method> },
    /// Nothing matched. `status` carries a route-requested `else` code.
    NotFound { status: Option<u16> },
}

impl<'r, H> Dispatch<'r, H> {
    pub fn status_code(&self) -> u16 {
        match self {
            Dispatch::Matched(_) => 200,
            Dispatch::MethodNotAllowed { .. } => 405,
            Dispatch::NotFound { status } => status.unwrap_or(404),
        }
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Dispatch::Matched(_) => "matched",
            Dispatch::MethodNotAllowed { .. } => "method_not_allowed",
            Dispatch::NotFound { .. } => "not_found",
        }
    }
}

/// Which tree a route lives in.
#[derive(Debug, Clone, Copy)]
enum Bucket {
    Root,
    Wildcard,
    Exact,
}

/// The route set for one server: routes by name plus the matching trees.
#[derive(Debug)]
pub struct Router<H> {
    macros: Macros,
    routes: Vec<Route<H>>,
    names: HashMap<String, usize>,
    root: RouteTree,
    wildcard: RouteTree,
    exact: HashMap<String, RouteTree>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new(Macros::defaults())
    }
}

impl<H> Router<H> {
    pub fn new(macros: Macros) -> Self {
        Self {
            macros,
            routes: Vec::new(),
            names: HashMap::new(),
            root: RouteTree::new(),
            wildcard: RouteTree::new(),
            exact: HashMap::new(),
        }
    }

    /// The type registry routes are compiled against.
    pub fn macros(&self) -> &Macros {
        &self.macros
    }

    /// Compile and register one route declaration.
    pub fn compile(
        &mut self,
        method: Method,
        subdomain: &str,
        path: &str,
        handler: H,
        name: &str,
    ) -> Result<&Route<H>, RouteError> {
        let route = Route::compile(method, subdomain, path, handler, name, &self.macros)?;
        self.register(route)
    }

    /// Insert an already compiled route.
    pub fn register(&mut self, route: Route<H>) -> Result<&Route<H>, RouteError> {
        if self.names.contains_key(&route.name) {
            return Err(RouteError::DuplicateName(route.name));
        }

        let idx = self.routes.len();
        let tree = match &route.subdomain {
            Subdomain::None => &mut self.root,
            Subdomain::Wildcard => &mut self.wildcard,
            Subdomain::Exact(label) => self.exact.entry(label.clone()).or_default(),
        };
        tree.insert(&route.segments, route.method.clone(), idx)
            .map_err(|e| match e {
                InsertError::Conflict { existing } => RouteError::Ambiguous {
                    route: route.name.clone(),
                    existing: self.routes[existing].name.clone(),
                },
                InsertError::Shadowed { existing, param } => RouteError::ShadowedParameter {
                    route: route.name.clone(),
                    param,
                    existing,
                },
                InsertError::Wildcard { existing, param } => RouteError::WildcardConflict {
                    route: route.name.clone(),
                    param,
                    existing,
                },
            })?;

        tracing::info!(
            route = %route.name,
            method = %route.method,
            subdomain = %route.subdomain,
            path = %route.path,
            "Registered route"
        );

        self.names.insert(route.name.clone(), idx);
        self.routes.push(route);
        Ok(&self.routes[idx])
    }

    /// Resolve a request. `subdomain` is the request's leading host label,
    /// empty when the request has none.
    pub fn dispatch(&self, method: &Method, subdomain: &str, path: &str) -> Dispatch<'_, H> {
        let label = subdomain.trim().to_ascii_lowercase();
        let mut not_allowed: Option<Vec<Method>> = None;
        let mut status: Option<u16> = None;

        for (bucket, tree) in self.trees(&label) {
            match tree.lookup(method, path) {
                TreeMatch::Found { route, captures } => {
                    let route = &self.routes[route];
                    tracing::trace!(route = %route.name, path, "dispatch matched");
                    let subdomain = match bucket {
                        Bucket::Root => None,
                        Bucket::Wildcard | Bucket::Exact => Some(label.clone()),
                    };
                    return Dispatch::Matched(RouteMatch {
                        route,
                        params: captures.into_iter().collect(),
                        subdomain,
                    });
                }
                TreeMatch::MethodNotAllowed { allowed } => {
                    not_allowed.get_or_insert(allowed);
                }
                TreeMatch::NotFound { status: code } => {
                    status = status.or(code);
                }
            }
        }

        tracing::trace!(%method, path, "dispatch did not match");
        match not_allowed {
            Some(allowed) => Dispatch::MethodNotAllowed { allowed },
            None => Dispatch::NotFound { status },
        }
    }

    /// Methods registered for the first tree node `path` resolves to.
    pub fn allowed_methods(&self, subdomain: &str, path: &str) -> Vec<Method> {
        let label = subdomain.trim().to_ascii_lowercase();
        let methods = self
            .trees(&label)
            .map(|(_, tree)| tree.allowed_methods(path))
            .find(|methods| !methods.is_empty())
            .unwrap_or_default();
        methods
    }

    /// Trees to try for a request label, most specific first.
    fn trees<'a>(&'a self, label: &'a str) -> impl Iterator<Item = (Bucket, &'a RouteTree)> {
        let exact = self
            .exact
            .get(label)
            .map(|tree| (Bucket::Exact, tree));
        let wildcard = (!label.is_empty() && !self.wildcard.is_empty())
            .then_some((Bucket::Wildcard, &self.wildcard));
        exact
            .into_iter()
            .chain(wildcard)
            .chain(std::iter::once((Bucket::Root, &self.root)))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn route(&self, name: &str) -> Option<&Route<H>> {
        self.names.get(name).map(|&i| &self.routes[i])
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

    fn router(routes: &[(Method, &str, &str, &str)]) -> Router<&'static str> {
        let mut router = Router::new(Macros::defaults());
        for (method, subdomain, path, name) in routes {
            router
                .compile(method.clone(), subdomain, path, "h", name)
                .unwrap();
        }
        router
    }

    #[test]
    fn test_default_route_name() {
        let r = router(&[(Method::GET, "admin.", "/users", "")]);
        assert!(r.route("GETadmin./users").is_some());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut r = router(&[(Method::GET, "", "/a", "home")]);
        let err = r.compile(Method::GET, "", "/b", "h", "home").unwrap_err();
        assert!(matches!(err, RouteError::DuplicateName(name) if name == "home"));
    }

    #[test]
    fn test_ambiguous_route_rejected() {
        let mut r = router(&[(Method::GET, "", "/a/{id:int}", "first")]);
        let err = r
            .compile(Method::GET, "", "/a/{id:int}/", "h", "second")
            .unwrap_err();
        assert!(matches!(err, RouteError::Ambiguous { existing, .. } if existing == "first"));
        assert!(r.route("second").is_none());
    }

    #[test]
    fn test_compile_error_reports_every_segment() {
        let mut r: Router<()> = Router::default();
        let err = r
            .compile(Method::GET, "", "/{a:nope}/{b:path}/c", (), "bad")
            .unwrap_err();
        match err {
            RouteError::Compile { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_subdomain_buckets() {
        let r = router(&[
            (Method::GET, "", "/", "root"),
            (Method::GET, "admin", "/", "admin"),
            (Method::GET, "*.", "/", "any"),
        ]);

        match r.dispatch(&Method::GET, "admin", "/") {
            Dispatch::Matched(m) => {
                assert_eq!(m.route.name(), "admin");
                assert_eq!(m.subdomain.as_deref(), Some("admin"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match r.dispatch(&Method::GET, "Shop", "/") {
            Dispatch::Matched(m) => {
                assert_eq!(m.route.name(), "any");
                assert_eq!(m.subdomain.as_deref(), Some("shop"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match r.dispatch(&Method::GET, "", "/") {
            Dispatch::Matched(m) => {
                assert_eq!(m.route.name(), "root");
                assert!(m.subdomain.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_falls_back_to_root_tree() {
        let r = router(&[
            (Method::GET, "admin", "/panel", "panel"),
            (Method::GET, "", "/about", "about"),
        ]);
        match r.dispatch(&Method::GET, "admin", "/about") {
            Dispatch::Matched(m) => assert_eq!(m.route.name(), "about"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            r.dispatch(&Method::GET, "", "/panel"),
            Dispatch::NotFound { status: None }
        ));
    }

    #[test]
    fn test_status_codes() {
        let r = router(&[
            (Method::GET, "", "/items/{id:int}", "item"),
            (Method::GET, "", "/pay/{id:int else 402}", "pay"),
        ]);
        assert_eq!(r.dispatch(&Method::GET, "", "/items/4").status_code(), 200);
        assert_eq!(r.dispatch(&Method::POST, "", "/items/4").status_code(), 405);
        assert_eq!(r.dispatch(&Method::GET, "", "/nope").status_code(), 404);
        assert_eq!(r.dispatch(&Method::GET, "", "/pay/x").status_code(), 402);
    }

    #[test]
    fn test_introspection() {
        let r = router(&[
            (Method::GET, "", "/games/{gameID:int}/clans/{clanID:int}", "clan"),
            (Method::PUT, "", "/games/{gameID:int}/clans/{clanID:int}", "clan_put"),
        ]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.route("clan").unwrap().param_names(), vec!["gameID", "clanID"]);
        assert_eq!(
            r.allowed_methods("", "/games/1/clans/2"),
            vec![Method::GET, Method::PUT]
        );
    }

    #[test]
    fn test_allowed_methods_by_subdomain() {
        let r = router(&[
            (Method::DELETE, "admin", "/users/{id:int}", "admin_delete"),
            (Method::GET, "", "/users/{id:int}", "user"),
        ]);
        assert_eq!(r.allowed_methods(" Admin ", "/users/3"), vec![Method::DELETE]);
        assert_eq!(r.allowed_methods("", "/users/3"), vec![Method::GET]);
        assert!(r.allowed_methods("", "/users/x").is_empty());
    }

    #[test]
    fn test_subdomain_parse() {
        assert_eq!(Subdomain::parse(""), Subdomain::None);
        assert_eq!(Subdomain::parse("*."), Subdomain::Wildcard);
        assert_eq!(Subdomain::parse("Admin."), Subdomain::Exact("admin".into()));
        assert_eq!(Subdomain::Exact("admin".into()).to_string(), "admin.");
    }
}
