//! Request classification.
//!
//! Only GET requests are intercepted. A GET is a navigation when the host
//! marks it as one, or when it accepts HTML: not every context flags its
//! document loads as navigations.

use serde::Serialize;

use super::{Request, RequestMode};

/// Retrieval class of an eligible request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    Navigation,
    SubResource,
}

/// Outcome of classifying an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not intercepted; the host handles it untouched.
    Passthrough,
    Intercept(RequestClass),
}

impl Classification {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Classification::Intercept(_))
    }

    pub fn class(&self) -> Option<RequestClass> {
        match self {
            Classification::Passthrough => None,
            Classification::Intercept(class) => Some(*class),
        }
    }
}

/// Classify an intercepted request.
pub fn classify(request: &Request) -> Classification {
    if !request.is_get() {
        return Classification::Passthrough;
    }

    let accepts_html = request.header("accept").is_some_and(|accept| accept.contains("text/html"));

    if request.mode == RequestMode::Navigate || accepts_html {
        Classification::Intercept(RequestClass::Navigation)
    } else {
        Classification::Intercept(RequestClass::SubResource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> url::Url {
        url::Url::parse(s).unwrap()
    }

    #[test]
    fn test_non_get_is_passthrough() {
        for method in ["POST", "PUT", "DELETE", "HEAD", "OPTIONS"] {
            let req = Request::navigate(url("https://example.com/")).with_method(method);
            assert_eq!(classify(&req), Classification::Passthrough, "{method}");
            assert!(!classify(&req).is_eligible());
        }
    }

    #[test]
    fn test_navigate_mode_is_navigation() {
        let req = Request::get(url("https://example.com/about")).with_mode(RequestMode::Navigate);
        assert_eq!(classify(&req).class(), Some(RequestClass::Navigation));
    }

    #[test]
    fn test_html_accept_is_navigation() {
        let req = Request::get(url("https://example.com/nav.html")).with_header("Accept", "text/html");
        assert_eq!(classify(&req).class(), Some(RequestClass::Navigation));
    }

    #[test]
    fn test_other_get_is_subresource() {
        let req = Request::get(url("https://example.com/app.js")).with_header("Accept", "*/*");
        assert_eq!(classify(&req), Classification::Intercept(RequestClass::SubResource));

        let bare = Request::get(url("https://example.com/logo.svg"));
        assert_eq!(classify(&bare).class(), Some(RequestClass::SubResource));
    }
}
