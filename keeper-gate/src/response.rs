//! Host-agnostic terminal responses.

/// Headers that keep proxies and browsers from caching gate pages.
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("cache-control", "no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

const HTML: &str = "text/html; charset=utf-8";

/// A complete response that the host must return as-is, skipping its own
/// request handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortCircuit {
    pub status: u16,
    /// Lower-case header names.
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl ShortCircuit {
    /// `503 Service Unavailable` with a non-cacheable HTML body.
    pub fn service_unavailable(html: String) -> Self {
        Self::html(503, html)
    }

    /// `200 OK` with a non-cacheable HTML body.
    pub fn page(html: String) -> Self {
        Self::html(200, html)
    }

    /// `303 See Other` to `location`.
    pub fn see_other(location: String) -> Self {
        Self {
            status: 303,
            headers: vec![("location", location)],
            body: String::new(),
        }
    }

    fn html(status: u16, body: String) -> Self {
        let mut headers = vec![("content-type", HTML.to_string())];
        headers.extend(NO_CACHE_HEADERS.iter().map(|(k, v)| (*k, v.to_string())));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Looks up a header value by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Redirect target, if this is a redirect.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}
