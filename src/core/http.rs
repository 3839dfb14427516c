use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

pub const APP_NAME: &str = "Spectral";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const APP_USER_AGENT: &str = concat!("Spectral/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client. Bodies are requested uncompressed so the bytes we
/// hash are exactly the bytes the upstream checksum was computed over.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(30))
        .build()
}
