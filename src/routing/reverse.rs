//! Reverse routing: route name + parameter values → URL.
//!
//! # Responsibilities
//! - Rebuild a path from a route's compiled segments
//! - Optionally check each value against the segment's predicate
//! - Produce absolute URLs, subdomain included
//!
//! # Design Decisions
//! - Reads the same segment list the matcher was built from
//! - Values are inserted verbatim; callers escape them if needed
//! - Argument order does not matter, extra arguments are ignored

use thiserror::Error;
use url::Url;

use super::router::{Route, Router, Subdomain};
use super::segment::CompiledSegment;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("unknown route \"{0}\"")]
    UnknownRoute(String),

    #[error("route \"{route}\": missing value for parameter \"{param}\"")]
    MissingParameter { route: String, param: String },

    #[error("route \"{route}\": invalid value \"{value}\" for parameter \"{param}\"")]
    InvalidValue {
        route: String,
        param: String,
        value: String,
    },

    #[error("route \"{0}\" has a wildcard subdomain; a subdomain label is required")]
    MissingSubdomain(String),

    #[error("invalid base URL: {0}")]
    InvalidBase(String),
}

impl<H> Router<H> {
    /// Build the path of route `name` from `(param, value)` pairs.
    pub fn build(&self, name: &str, kv: &[(&str, &str)]) -> Result<String, BuildError> {
        let route = self.lookup_route(name)?;
        render(route, kv, false)
    }

    /// Like [`Router::build`], but every value must satisfy its predicate.
    pub fn build_checked(&self, name: &str, kv: &[(&str, &str)]) -> Result<String, BuildError> {
        let route = self.lookup_route(name)?;
        render(route, kv, true)
    }

    fn lookup_route(&self, name: &str) -> Result<&Route<H>, BuildError> {
        self.route(name)
            .ok_or_else(|| BuildError::UnknownRoute(name.to_string()))
    }
}

fn render<H>(route: &Route<H>, kv: &[(&str, &str)], validate: bool) -> Result<String, BuildError> {
    let mut path = String::new();
    for segment in route.segments() {
        let text = match segment {
            CompiledSegment::Literal(text) => text.as_str(),
            CompiledSegment::Dynamic(param) | CompiledSegment::Wildcard(param) => {
                let value = kv
                    .iter()
                    .find(|(k, _)| *k == param.name())
                    .map(|&(_, v)| v)
                    .ok_or_else(|| BuildError::MissingParameter {
                        route: route.name().to_string(),
                        param: param.name().to_string(),
                    })?;
                if validate && !param.matches(value) {
                    return Err(BuildError::InvalidValue {
                        route: route.name().to_string(),
                        param: param.name().to_string(),
                        value: value.to_string(),
                    });
                }
                value
            }
        };
        // An empty wildcard tail adds nothing.
        if text.is_empty() && matches!(segment, CompiledSegment::Wildcard(_)) {
            continue;
        }
        path.push('/');
        path.push_str(text);
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(path)
}

/// Builds absolute URLs against a base such as `https://example.com:8443`.
#[derive(Debug)]
pub struct UrlBuilder<'r, H> {
    router: &'r Router<H>,
    base: Url,
    host: String,
}

impl<'r, H> UrlBuilder<'r, H> {
    pub fn new(router: &'r Router<H>, base: &str) -> Result<Self, BuildError> {
        let base = Url::parse(base).map_err(|e| BuildError::InvalidBase(e.to_string()))?;
        let host = base
            .host_str()
            .filter(|_| !base.cannot_be_a_base())
            .ok_or_else(|| BuildError::InvalidBase(format!("{base} has no host")))?
            .to_string();
        Ok(Self { router, base, host })
    }

    /// Absolute URL of route `name`. `subdomain` is used only by
    /// wildcard-subdomain routes, where it is required.
    pub fn url(
        &self,
        name: &str,
        subdomain: Option<&str>,
        kv: &[(&str, &str)],
    ) -> Result<Url, BuildError> {
        let route = self.router.lookup_route(name)?;
        let path = render(route, kv, false)?;

        let host = match route.subdomain() {
            Subdomain::None => self.host.clone(),
            Subdomain::Exact(label) => format!("{label}.{}", self.host),
            Subdomain::Wildcard => match subdomain.map(str::trim).filter(|s| !s.is_empty()) {
                Some(label) => format!("{label}.{}", self.host),
                None => return Err(BuildError::MissingSubdomain(route.name().to_string())),
            },
        };

        let mut url = self.base.clone();
        url.set_host(Some(&host))
            .map_err(|e| BuildError::InvalidBase(e.to_string()))?;
        url.set_path(&path);
        Ok(url)
    }
}
