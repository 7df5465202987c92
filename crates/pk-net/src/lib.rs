//! Networking for page helpers: request options, URL resolution, transports,
//! and the guarded JSON fetch.

pub mod fetch;
pub mod request;
pub mod transport;
pub mod url;

pub use fetch::FetchConfig;
pub use fetch::FetchError;
pub use fetch::GuardedFetch;
pub use request::CredentialsMode;
pub use request::FetchRequest;
pub use request::Header;
pub use request::HttpMethod;
pub use request::HttpStatusCode;
pub use request::RequestConfig;
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use transport::TransportResponse;
pub use url::FetchUrl;
pub use url::Scheme;
