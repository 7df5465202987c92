//! JSON fetch that reports every failure to the user before returning it.

use crate::request::HttpStatusCode;
use crate::request::RequestConfig;
use crate::transport::Transport;
use crate::transport::TransportResponse;
use crate::url::FetchUrl;
use pk_core::PageError;
use pk_core::PageResult;
use pk_toast::Notifier;
use pk_toast::Severity;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Settings shared by every request issued through one [`GuardedFetch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Page URL that relative targets resolve against. It also defines the
    /// origin used by [`crate::CredentialsMode::SameOrigin`].
    pub base_url: Option<String>,
}

impl FetchConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }

    pub fn validate(&self) -> PageResult<Option<FetchUrl>> {
        self.base_url
            .as_deref()
            .map(|raw| {
                FetchUrl::parse(raw).map_err(|error| {
                    PageError::new(
                        "config.fetch.base_url_invalid",
                        format!("`base_url` is not a usable page URL: {}", error.message),
                    )
                })
            })
            .transpose()
    }
}

/// Failure of a guarded fetch. Each variant has already been shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the response could not be received.
    #[error("{}", .0.message)]
    Transport(PageError),
    /// The response arrived with a non-success status.
    #[error("HTTP error! status: {status}")]
    HttpStatus { status: u16 },
    /// The response body is not valid JSON for the requested type.
    #[error("invalid JSON response: {0}")]
    Parse(String),
    /// The request options failed validation before anything was sent.
    #[error("{}", .0.message)]
    InvalidRequest(PageError),
}

impl FetchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "net.fetch.transport",
            Self::HttpStatus { .. } => "net.fetch.http_status",
            Self::Parse(_) => "net.fetch.parse",
            Self::InvalidRequest(_) => "net.fetch.invalid_request",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status } => Some(*status),
            _ => None,
        }
    }
}

/// Single-attempt JSON fetch wired to a transport and a notification sink.
#[derive(Debug)]
pub struct GuardedFetch<T, N> {
    transport: T,
    notifier: N,
    base_url: Option<FetchUrl>,
}

impl<T, N> GuardedFetch<T, N>
where
    T: Transport,
    N: Notifier,
{
    pub fn new(transport: T, notifier: N, config: &FetchConfig) -> PageResult<Self> {
        let base_url = config.validate()?;
        Ok(Self {
            transport,
            notifier,
            base_url,
        })
    }

    pub fn base_url(&self) -> Option<&FetchUrl> {
        self.base_url.as_ref()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Fetches `url` and parses the body as untyped JSON.
    pub async fn fetch_json(
        &self,
        url: &str,
        options: &RequestConfig,
    ) -> Result<serde_json::Value, FetchError> {
        self.fetch(url, options).await
    }

    /// Fetches `url` and decodes the body into `D`.
    ///
    /// On failure an error toast carrying the error text is presented before
    /// the error is returned.
    pub async fn fetch<D: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestConfig,
    ) -> Result<D, FetchError> {
        match self.attempt(url, options).await {
            Ok(value) => Ok(value),
            Err(error) => {
                tracing::warn!(url, code = error.code(), %error, "fetch failed");
                self.notifier.notify(&error.to_string(), Severity::Error);
                Err(error)
            }
        }
    }

    async fn attempt<D: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestConfig,
    ) -> Result<D, FetchError> {
        let target =
            FetchUrl::resolve(self.base_url.as_ref(), url).map_err(FetchError::InvalidRequest)?;
        let request = options
            .prepare(target, self.base_url.as_ref())
            .map_err(FetchError::InvalidRequest)?;

        tracing::debug!(
            method = request.method.as_str(),
            url = request.url.as_str(),
            "sending request"
        );
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(FetchError::Transport)?;

        let status = HttpStatusCode::new(response.status()).map_err(FetchError::Transport)?;
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.into_body().await.map_err(FetchError::Transport)?;
        serde_json::from_slice(&body).map_err(|error| FetchError::Parse(error.to_string()))
    }
}
