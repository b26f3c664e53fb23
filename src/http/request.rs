//! Request inspection.
//!
//! # Responsibilities
//! - Derive the subdomain label from the Host header
//! - Name the request-id header shared by the middleware layers
//!
//! # Design Decisions
//! - IP literals never carry a subdomain
//! - With a root domain configured, only hosts under it yield a label
//! - Without one, a host needs at least three labels (`a.example.com`)

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, Uri};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Host of the request: the `Host` header, or the URI authority (HTTP/2).
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.host())
        .unwrap_or("")
}

/// Leading label of `host` when it is a subdomain, else `""`.
pub fn subdomain_of<'a>(host: &'a str, root_domain: Option<&str>) -> &'a str {
    let host = strip_port(host.trim()).trim_end_matches('.');
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return "";
    }

    let prefix = match root_domain.map(|r| r.trim().trim_end_matches('.')) {
        Some(root) if !root.is_empty() => {
            let cut = host.len().saturating_sub(root.len());
            if cut < 2 || !host.is_char_boundary(cut) {
                return "";
            }
            let (prefix, suffix) = host.split_at(cut);
            if !suffix.eq_ignore_ascii_case(root) {
                return "";
            }
            match prefix.strip_suffix('.') {
                Some(prefix) => prefix,
                None => return "",
            }
        }
        _ => {
            if host.matches('.').count() < 2 {
                return "";
            }
            host
        }
    };

    prefix.split('.').next().unwrap_or("")
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal: no subdomain either way.
        return "";
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_with_root_domain() {
        let root = Some("example.com");
        assert_eq!(subdomain_of("admin.example.com", root), "admin");
        assert_eq!(subdomain_of("Admin.Example.com:8080", root), "Admin");
        assert_eq!(subdomain_of("a.b.example.com", root), "a");
        assert_eq!(subdomain_of("example.com", root), "");
        assert_eq!(subdomain_of("other.org", root), "");
        assert_eq!(subdomain_of("badexample.com", root), "");
    }

    #[test]
    fn test_subdomain_without_root_domain() {
        assert_eq!(subdomain_of("shop.example.com", None), "shop");
        assert_eq!(subdomain_of("example.com", None), "");
        assert_eq!(subdomain_of("localhost:3000", None), "");
    }

    #[test]
    fn test_ip_hosts_have_no_subdomain() {
        assert_eq!(subdomain_of("127.0.0.1:8080", None), "");
        assert_eq!(subdomain_of("[::1]:8080", Some("example.com")), "");
    }

    #[test]
    fn test_request_host_prefers_header() {
        let mut headers = HeaderMap::new();
        let uri: Uri = "http://fallback.example.com/x".parse().unwrap();
        assert_eq!(request_host(&headers, &uri), "fallback.example.com");
        headers.insert(header::HOST, "api.example.com".parse().unwrap());
        assert_eq!(request_host(&headers, &uri), "api.example.com");
    }
}
