//! Intercepted request model and cache identities.
//!
//! A [`Request`] is what the host hands the worker for every fetch event.
//! A [`ResourceId`] is the normalized cache key derived from it; one can only
//! be built for GET requests, so nothing else is ever stored or matched.

pub mod classify;
pub mod url;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::hash::compute_cache_key;

pub use classify::{Classification, RequestClass, classify};
pub use url::{UrlError, canonicalize, resolve};

/// Declared purpose of a request, as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(Self::Navigate),
            "same-origin" => Ok(Self::SameOrigin),
            "no-cors" => Ok(Self::NoCors),
            "cors" => Ok(Self::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: ::url::Url,
    #[serde(default)]
    pub mode: RequestMode,
    /// Header pairs in arrival order. Lookups are case-insensitive.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain GET sub-resource request.
    pub fn get(url: ::url::Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Cors, headers: Vec::new() }
    }

    /// A top-level document load as browsers issue it.
    pub fn navigate(url: ::url::Url) -> Self {
        Self {
            method: "GET".into(),
            url,
            mode: RequestMode::Navigate,
            headers: vec![("accept".into(), "text/html,application/xhtml+xml,*/*;q=0.8".into())],
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Normalized cache identity of a GET request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    url: ::url::Url,
}

impl ResourceId {
    /// Identity of an intercepted request, or `None` for anything but GET.
    pub fn for_request(request: &Request) -> Option<Self> {
        if !request.is_get() {
            return None;
        }
        let mut url = request.url.clone();
        url.set_fragment(None);
        Some(Self { url })
    }

    /// Resolve a manifest-style identifier against the scope.
    pub fn resolve(scope: &::url::Url, id: &str) -> Result<Self, Error> {
        Ok(Self { url: resolve(scope, id)? })
    }

    /// Identity of an already absolute URL.
    pub fn parse(input: &str) -> Result<Self, Error> {
        Ok(Self { url: canonicalize(input)? })
    }

    pub fn url(&self) -> &::url::Url {
        &self.url
    }

    /// Store key: SHA-256 over method and URL.
    pub fn key(&self) -> String {
        compute_cache_key("GET", self.url.as_str())
    }

    /// The GET request used to populate this identity from the network.
    pub fn to_request(&self) -> Request {
        Request::get(self.url.clone())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> ::url::Url {
        ::url::Url::parse(s).unwrap()
    }

    #[test]
    fn test_resource_id_only_for_get() {
        let get = Request::get(url("https://example.com/app.js"));
        assert!(ResourceId::for_request(&get).is_some());

        let lower = get.clone().with_method("get");
        assert!(ResourceId::for_request(&lower).is_some());

        let post = get.with_method("POST");
        assert!(ResourceId::for_request(&post).is_none());
    }

    #[test]
    fn test_resource_id_drops_fragment() {
        let a = ResourceId::for_request(&Request::get(url("https://example.com/page#one"))).unwrap();
        let b = ResourceId::parse("https://example.com/page").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_resource_id_key_differs_by_query() {
        let a = ResourceId::parse("https://example.com/app.js?v=1").unwrap();
        let b = ResourceId::parse("https://example.com/app.js?v=2").unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let req = Request::get(url("https://example.com/")).with_header("Accept", "text/html");
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn test_request_mode_from_str() {
        assert_eq!("navigate".parse::<RequestMode>().unwrap(), RequestMode::Navigate);
        assert_eq!("No-Cors".parse::<RequestMode>().unwrap(), RequestMode::NoCors);
        assert!("websocket".parse::<RequestMode>().is_err());
    }
}
