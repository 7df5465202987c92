//! Request target parsing and resolution.

use pk_core::PageError;
use pk_core::PageResult;
use url::Url;

/// Supported application-level URL schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Absolute, validated request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchUrl {
    parsed: Url,
    scheme: Scheme,
    host: String,
    port: u16,
}

impl FetchUrl {
    pub fn parse(input: &str) -> PageResult<Self> {
        let parsed = Url::parse(input).map_err(|error| {
            PageError::new(
                "net.url.invalid",
                format!("failed to parse URL `{input}`: {error}"),
            )
        })?;

        Self::from_url(parsed)
    }

    /// Resolves `input` against `base` the way a page resolves `fetch("/path")`.
    ///
    /// Absolute inputs ignore the base. Relative inputs require one.
    pub fn resolve(base: Option<&FetchUrl>, input: &str) -> PageResult<Self> {
        match Url::parse(input) {
            Ok(absolute) => Self::from_url(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = base.ok_or_else(|| {
                    PageError::new(
                        "net.url.base_missing",
                        format!("relative URL `{input}` needs a configured base URL"),
                    )
                })?;
                let joined = base.parsed.join(input).map_err(|error| {
                    PageError::new(
                        "net.url.invalid",
                        format!("failed to resolve `{input}` against `{}`: {error}", base.as_str()),
                    )
                })?;
                Self::from_url(joined)
            }
            Err(error) => Err(PageError::new(
                "net.url.invalid",
                format!("failed to parse URL `{input}`: {error}"),
            )),
        }
    }

    fn from_url(mut parsed: Url) -> PageResult<Self> {
        if parsed.cannot_be_a_base() {
            return Err(PageError::new(
                "net.url.invalid_base",
                "URL cannot be used as a request target",
            ));
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(PageError::new(
                "net.url.credentials_disallowed",
                "URL userinfo (`username:password@`) is not allowed",
            ));
        }

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(PageError::new(
                    "net.url.scheme_unsupported",
                    format!("unsupported scheme `{other}`"),
                ));
            }
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| PageError::new("net.url.host_missing", "URL must include a host"))?
            .to_ascii_lowercase();

        let port = parsed.port_or_known_default().ok_or_else(|| {
            PageError::new(
                "net.url.port_missing",
                "unable to determine effective port for URL",
            )
        })?;

        // Fragments are client-side only and never sent on the wire.
        parsed.set_fragment(None);

        Ok(Self {
            parsed,
            scheme,
            host,
            port,
        })
    }

    pub fn as_str(&self) -> &str {
        self.parsed.as_str()
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }

    pub fn same_origin(&self, other: &FetchUrl) -> bool {
        self.scheme == other.scheme && self.host == other.host && self.port == other.port
    }

    pub fn path_and_query(&self) -> String {
        let path = if self.parsed.path().is_empty() {
            "/"
        } else {
            self.parsed.path()
        };

        match self.parsed.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_owned(),
        }
    }
}
