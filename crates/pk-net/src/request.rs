//! Structured request configuration and its validated wire form.

use crate::url::FetchUrl;
use pk_core::PageError;
use pk_core::PageResult;
use serde::Serialize;

const CREDENTIAL_HEADERS: &[&str] = &["cookie", "authorization", "proxy-authorization"];

/// Supported outbound HTTP methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }

    pub fn from_name(name: &str) -> PageResult<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(PageError::new(
                "net.http.method_unsupported",
                format!("unsupported HTTP method `{name}`"),
            )),
        }
    }

    fn allows_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

/// Whether credential headers travel with a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialsMode {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

impl CredentialsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::SameOrigin => "same-origin",
            Self::Include => "include",
        }
    }

    pub fn from_name(name: &str) -> PageResult<Self> {
        match name {
            "omit" => Ok(Self::Omit),
            "same-origin" => Ok(Self::SameOrigin),
            "include" => Ok(Self::Include),
            _ => Err(PageError::new(
                "net.http.credentials_mode_invalid",
                format!("unknown credentials mode `{name}` (expected: omit|same-origin|include)"),
            )),
        }
    }
}

/// Single HTTP header with validated wire-safe name/value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: &str, value: &str) -> PageResult<Self> {
        if !is_valid_header_name(name) {
            return Err(PageError::new(
                "net.http.header_name_invalid",
                format!("invalid HTTP header name `{name}`"),
            ));
        }

        if value.bytes().any(|byte| matches!(byte, b'\r' | b'\n' | 0)) {
            return Err(PageError::new(
                "net.http.header_value_invalid",
                format!("invalid characters found in HTTP header `{name}`"),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }
}

/// Caller-facing request options. Nothing is checked until [`RequestConfig::prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub credentials: CredentialsMode,
}

impl RequestConfig {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn credentials(mut self, mode: CredentialsMode) -> Self {
        self.credentials = mode;
        self
    }

    /// Serialises `value` as the body and marks it as JSON.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> PageResult<Self> {
        let body = serde_json::to_vec(value).map_err(|error| {
            PageError::new(
                "net.http.body_encode_failed",
                format!("failed to encode JSON request body: {error}"),
            )
        })?;

        Ok(self.header("Content-Type", "application/json").body(body))
    }

    /// Validates the options against a resolved target.
    ///
    /// `page` is the origin the request is issued from; when absent every
    /// target counts as same-origin.
    pub fn prepare(&self, url: FetchUrl, page: Option<&FetchUrl>) -> PageResult<FetchRequest> {
        let mut headers = Vec::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            headers.push(Header::new(name, value)?);
        }

        ensure_singleton_header(&headers, "host")?;
        ensure_singleton_header(&headers, "content-length")?;
        ensure_singleton_header(&headers, "content-type")?;

        let body = self.body.clone().unwrap_or_default();
        if !body.is_empty() && !self.method.allows_body() {
            return Err(PageError::new(
                "net.http.body_disallowed",
                format!("{} requests must not include a body", self.method.as_str()),
            ));
        }

        let send_credentials = match self.credentials {
            CredentialsMode::Omit => false,
            CredentialsMode::Include => true,
            CredentialsMode::SameOrigin => page.is_none_or(|page| page.same_origin(&url)),
        };
        if !send_credentials {
            headers.retain(|header| {
                !CREDENTIAL_HEADERS
                    .iter()
                    .any(|name| header.name.eq_ignore_ascii_case(name))
            });
        }

        Ok(FetchRequest {
            method: self.method,
            url,
            headers,
            body,
            credentials: self.credentials,
        })
    }
}

/// Validated request handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: HttpMethod,
    pub url: FetchUrl,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
    pub credentials: CredentialsMode,
}

impl FetchRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }
}

/// HTTP status code wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HttpStatusCode(u16);

impl HttpStatusCode {
    pub fn new(code: u16) -> PageResult<Self> {
        if (100..=599).contains(&code) {
            return Ok(Self(code));
        }

        Err(PageError::new(
            "net.http.status_invalid",
            format!("status code must be 100-599, got `{code}`"),
        ))
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn is_success(self) -> bool {
        (200..=299).contains(&self.0)
    }
}

fn ensure_singleton_header(headers: &[Header], name: &str) -> PageResult<()> {
    let count = headers
        .iter()
        .filter(|header| header.name.eq_ignore_ascii_case(name))
        .count();

    if count <= 1 {
        return Ok(());
    }

    Err(PageError::new(
        "net.http.duplicate_header",
        format!("header `{name}` must appear at most once"),
    ))
}

fn is_valid_header_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    name.bytes().all(is_token_char)
}

fn is_token_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

#[cfg(test)]
mod tests {
    use super::CredentialsMode;
    use super::HttpMethod;
    use super::HttpStatusCode;
    use super::RequestConfig;
    use crate::url::FetchUrl;

    fn url(input: &str) -> FetchUrl {
        match FetchUrl::parse(input) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn default_config_is_a_credentialed_get() {
        let prepared = RequestConfig::default().prepare(url("https://example.com/"), None);
        let prepared = match prepared {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(prepared.method, HttpMethod::Get);
        assert_eq!(prepared.credentials, CredentialsMode::SameOrigin);
        assert!(prepared.body.is_empty());
    }

    #[test]
    fn get_request_cannot_have_body() {
        let prepared = RequestConfig::get()
            .body(b"x".to_vec())
            .prepare(url("https://example.com/"), None);
        assert!(prepared.is_err());
        if let Err(error) = prepared {
            assert_eq!(error.code, "net.http.body_disallowed");
        }
    }

    #[test]
    fn json_body_sets_content_type() {
        let config = RequestConfig::post().json(&serde_json::json!({ "task": 7 }));
        let prepared =
            config.and_then(|config| config.prepare(url("https://example.com/api"), None));
        let prepared = match prepared {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(prepared.header("content-type"), Some("application/json"));
        assert_eq!(prepared.body, br#"{"task":7}"#);
    }

    #[test]
    fn rejects_invalid_header_names_and_values() {
        let bad_name = RequestConfig::get()
            .header("X Bad", "1")
            .prepare(url("https://example.com/"), None);
        assert!(bad_name.is_err());

        let bad_value = RequestConfig::get()
            .header("X-Ok", "a\r\nInjected: 1")
            .prepare(url("https://example.com/"), None);
        assert!(bad_value.is_err());
    }

    #[test]
    fn rejects_duplicate_content_type() {
        let prepared = RequestConfig::post()
            .header("Content-Type", "text/plain")
            .header("content-type", "application/json")
            .prepare(url("https://example.com/"), None);
        assert!(prepared.is_err());
    }

    #[test]
    fn same_origin_mode_strips_credentials_cross_origin() {
        let page = url("https://app.example.com/");
        let config = RequestConfig::get()
            .header("Cookie", "session=1")
            .header("Accept", "application/json");

        let same = config.prepare(url("https://app.example.com/api"), Some(&page));
        assert!(same.is_ok_and(|request| request.header("cookie") == Some("session=1")));

        let cross = config.prepare(url("https://cdn.example.com/api"), Some(&page));
        let cross = match cross {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(cross.header("cookie"), None);
        assert_eq!(cross.header("accept"), Some("application/json"));
    }

    #[test]
    fn omit_and_include_modes_override_origin_checks() {
        let page = url("https://app.example.com/");
        let omitted = RequestConfig::get()
            .header("Authorization", "Bearer t")
            .credentials(CredentialsMode::Omit)
            .prepare(url("https://app.example.com/api"), Some(&page));
        assert!(omitted.is_ok_and(|request| request.header("authorization").is_none()));

        let included = RequestConfig::get()
            .header("Authorization", "Bearer t")
            .credentials(CredentialsMode::Include)
            .prepare(url("https://other.example.org/api"), Some(&page));
        assert!(
            included.is_ok_and(|request| request.header("authorization") == Some("Bearer t"))
        );
    }

    #[test]
    fn parses_method_and_credentials_names() {
        assert_eq!(HttpMethod::from_name("patch"), Ok(HttpMethod::Patch));
        assert!(HttpMethod::from_name("TRACE").is_err());
        assert_eq!(
            CredentialsMode::from_name("include"),
            Ok(CredentialsMode::Include)
        );
        assert!(CredentialsMode::from_name("always").is_err());
    }

    #[test]
    fn status_code_range_is_enforced() {
        assert!(HttpStatusCode::new(200).is_ok_and(HttpStatusCode::is_success));
        assert!(HttpStatusCode::new(404).is_ok_and(|status| !status.is_success()));
        assert!(HttpStatusCode::new(99).is_err());
        assert!(HttpStatusCode::new(600).is_err());
    }
}
