use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AdhkarError, Result};
use crate::geo::{API_KEY_HEADER, GeoUpstream};

fn build_client() -> Client {
    Client::builder()
        .user_agent(concat!("vsadhkar/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

async fn get_json(
    request: reqwest::RequestBuilder,
    service: &'static str,
) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| AdhkarError::network(service, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AdhkarError::UpstreamStatus {
            service,
            status: status.as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AdhkarError::decode("geo response", e))
}

/// Direct client for the country/state/city API. Needs the API key.
#[derive(Clone)]
pub struct CscClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CscClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl GeoUpstream for CscClient {
    async fn fetch(&self, path: &str) -> Result<Value> {
        debug!("Upstream geo GET {}", path);
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key);
        get_json(request, "geo API").await
    }
}

/// Client for a running geo proxy; no key required.
#[derive(Clone)]
pub struct ProxyGeoClient {
    client: Client,
    base_url: String,
}

impl ProxyGeoClient {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: proxy_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoUpstream for ProxyGeoClient {
    async fn fetch(&self, path: &str) -> Result<Value> {
        debug!("Proxy geo GET {}", path);
        let request = self.client.get(format!("{}/api{}", self.base_url, path));
        get_json(request, "geo proxy").await
    }
}
