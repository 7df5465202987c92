//! Transport contracts and the reqwest-backed implementation.

use crate::request::FetchRequest;
use crate::request::HttpMethod;
use pk_core::PageError;
use pk_core::PageResult;
use std::future::Future;

/// Issues exactly one request per call. Implementations never retry.
pub trait Transport {
    type Response: TransportResponse;

    fn send(&self, request: &FetchRequest) -> impl Future<Output = PageResult<Self::Response>>;
}

/// Response head received from a transport; the body is read separately.
pub trait TransportResponse {
    fn status(&self) -> u16;

    fn into_body(self) -> impl Future<Output = PageResult<Vec<u8>>>;
}

/// Transport over a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReqwestTransport {
    type Response = ReqwestResponse;

    async fn send(&self, request: &FetchRequest) -> PageResult<Self::Response> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.as_str());
        for header in &request.headers {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|error| {
            PageError::new(
                "net.transport.send_failed",
                format!("failed to fetch `{}`: {error}", request.url.as_str()),
            )
        })?;

        Ok(ReqwestResponse { inner: response })
    }
}

/// Response wrapper returned by [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestResponse {
    inner: reqwest::Response,
}

impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    async fn into_body(self) -> PageResult<Vec<u8>> {
        let bytes = self.inner.bytes().await.map_err(|error| {
            PageError::new(
                "net.transport.body_failed",
                format!("failed to read response body: {error}"),
            )
        })?;
        Ok(bytes.to_vec())
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}
