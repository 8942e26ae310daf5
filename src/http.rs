//! HTTP client construction helpers.

use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::options::ClientConfig;

/// Build a configured HTTP client from client configuration.
///
/// This applies common configuration like timeouts and proxies.
pub(crate) fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().timeout(config.timeout);

    if let Some(proxy_url) = &config.proxy {
        if let Ok(proxy) = reqwest::Proxy::all(proxy_url) {
            builder = builder.proxy(proxy);
        }
    }

    builder.build()
}

/// Add extra headers to a request if any are configured.
pub(crate) fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = ClientConfig::new("test");
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let config = ClientConfig::new("test").with_proxy("http://proxy.example.com:8080");
        assert!(build_http_client(&config).is_ok());
    }
}
