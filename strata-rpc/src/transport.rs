//! HTTP transport to a PostgREST-style gateway.
//!
//! Remote procedures are invoked with `POST {endpoint}/rest/v1/rpc/{function}`
//! and a JSON object of named arguments. Every request carries the API key
//! both as the `apikey` header and as a bearer token.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{RpcError, RpcResult};

/// Path prefix of the REST API on the gateway.
pub const REST_PATH: &str = "rest/v1";

/// Invokes remote procedures by name.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    /// Call `function` with named arguments. A void function yields `Value::Null`.
    async fn call(&self, function: &str, args: &Value) -> RpcResult<Value>;

    /// Side-effect-free read of the gateway root, returning the raw body.
    async fn ping(&self) -> RpcResult<String>;
}

#[async_trait::async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    async fn call(&self, function: &str, args: &Value) -> RpcResult<Value> {
        (**self).call(function, args).await
    }

    async fn ping(&self) -> RpcResult<String> {
        (**self).ping().await
    }
}

/// HTTP client for a single gateway.
pub struct PostgrestTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for PostgrestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl PostgrestTransport {
    /// Create a transport with its own client and request timeout.
    pub fn new(endpoint: &str, api_key: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("strata/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, endpoint, api_key)
    }

    /// Create a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        endpoint: &str,
        api_key: impl Into<String>,
    ) -> RpcResult<Self> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| RpcError::endpoint(endpoint, e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RpcError::endpoint(endpoint, "scheme must be http or https"));
        }
        if parsed.host_str().is_none() {
            return Err(RpcError::endpoint(endpoint, "missing host"));
        }

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// The gateway base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a remote procedure.
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/{}/rpc/{}", self.base_url, REST_PATH, function)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Return the response unchanged on a 2xx status, or an
    /// [`RpcError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> RpcResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RpcError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl RpcTransport for PostgrestTransport {
    async fn call(&self, function: &str, args: &Value) -> RpcResult<Value> {
        debug!(function, "Calling remote procedure");

        let response = self
            .authorized(self.client.post(self.rpc_url(function)))
            .json(args)
            .send()
            .await?;

        let text = Self::ensure_success(response).await?.text().await?;
        decode_body(&text)
    }

    async fn ping(&self) -> RpcResult<String> {
        let response = self
            .authorized(self.client.get(format!("{}/{}/", self.base_url, REST_PATH)))
            .send()
            .await?;

        Ok(Self::ensure_success(response).await?.text().await?)
    }
}

/// Void functions answer `204 No Content`; anything else must be JSON.
fn decode_body(text: &str) -> RpcResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| RpcError::Decode(e.to_string()))
}
