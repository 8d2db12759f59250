//! Shared helpers: the HTTP transport seam and URL handling

pub mod http_client;
pub mod url;

pub use http_client::{FetchError, HttpTransport, ReqwestTransport};
pub use url::UrlUtils;
