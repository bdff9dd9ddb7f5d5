//! Redirect targets that never accumulate query parameters.

/// User-facing message carried on a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Notice::Error(message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice::Success(message.into())
    }

    fn key(&self) -> &'static str {
        match self {
            Notice::Error(_) => "error",
            Notice::Success(_) => "success",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Error(m) | Notice::Success(m) => m,
        }
    }
}

/// Returns `request_uri` without its query string or fragment.
pub fn clean_path(request_uri: &str) -> &str {
    let end = request_uri.find(['?', '#']).unwrap_or(request_uri.len());
    match &request_uri[..end] {
        "" => "/",
        path => path,
    }
}

/// Builds `<path>?error=<msg>` or `<path>?success=<msg>` from the current URI.
///
/// Whatever query the request carried is dropped, including the submitted
/// activation code.
pub fn clean_redirect(request_uri: &str, notice: &Notice) -> String {
    format!(
        "{}?{}={}",
        clean_path(request_uri),
        notice.key(),
        urlencoding::encode(notice.message())
    )
}

/// Reads a `error=` / `success=` message from a query string, if present.
pub fn notice_from_query(query: Option<&str>) -> Option<Notice> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes()).find_map(|(k, v)| {
        if v.trim().is_empty() {
            return None;
        }
        match k.as_ref() {
            "error" => Some(Notice::Error(v.into_owned())),
            "success" => Some(Notice::Success(v.into_owned())),
            _ => None,
        }
    })
}
