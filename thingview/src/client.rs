use core::future::Future;

use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::{
    Method, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, HeaderMap, HeaderValue},
};
use serde_json::Value;
use thingview_common::ThingDescription;

use crate::{Error, GatewayConfig, Result};

/// Everything the model needs from the gateway.
///
/// Futures are not required to be `Send`; the view drives them on a single
/// thread.
pub trait Transport {
    fn get_description(&self, href: &str) -> impl Future<Output = Result<ThingDescription>>;

    /// Current value of every property, keyed by name.
    fn get_properties(&self, href: &str) -> impl Future<Output = Result<IndexMap<String, Value>>>;

    /// Writes `{name: value}` and returns the value the gateway accepted.
    fn put_property(
        &self,
        href: &str,
        name: &str,
        value: Value,
    ) -> impl Future<Output = Result<Value>>;

    fn post_action(&self, href: &str, body: Value) -> impl Future<Output = Result<()>>;

    /// Fetches an image or other media. Never served from a cache.
    fn fetch_media(&self, href: &str) -> impl Future<Output = Result<Bytes>>;

    /// Adds the credential headers to an outgoing request, for requests made
    /// outside this transport such as a streaming player's segment fetches.
    fn authorize(&self, headers: &mut HeaderMap);
}

pub struct HttpClient {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn request(&self, method: Method, href: &str) -> Result<RequestBuilder> {
        let url = self.config.resolve(href)?;
        tracing::debug!("{method} {url}");

        let mut req = self.http.request(method, url);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }

        Ok(req)
    }

    fn api(&self, method: Method, href: &str) -> Result<RequestBuilder> {
        Ok(self.request(method, href)?.header(ACCEPT, "application/json"))
    }

    async fn send(req: RequestBuilder) -> Result<Response> {
        let res = req.send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status { status: status.as_u16(), url: res.url().to_string() });
        }

        Ok(res)
    }
}

impl Transport for HttpClient {
    async fn get_description(&self, href: &str) -> Result<ThingDescription> {
        let res = Self::send(self.api(Method::GET, href)?).await?;
        Ok(res.json().await?)
    }

    async fn get_properties(&self, href: &str) -> Result<IndexMap<String, Value>> {
        let res = Self::send(self.api(Method::GET, href)?).await?;
        Ok(res.json().await?)
    }

    async fn put_property(&self, href: &str, name: &str, value: Value) -> Result<Value> {
        let mut body = serde_json::Map::new();
        body.insert(name.to_owned(), value.clone());

        let res = Self::send(self.api(Method::PUT, href)?.json(&body)).await?;
        let bytes = res.bytes().await?;

        if bytes.is_empty() {
            return Ok(value);
        }

        let accepted = serde_json::from_slice::<Value>(&bytes)?;
        Ok(accepted.get(name).cloned().unwrap_or(value))
    }

    async fn post_action(&self, href: &str, body: Value) -> Result<()> {
        Self::send(self.api(Method::POST, href)?.json(&body)).await?;
        Ok(())
    }

    async fn fetch_media(&self, href: &str) -> Result<Bytes> {
        let req = self
            .request(Method::GET, href)?
            .header(ACCEPT, "*/*")
            .header(CACHE_CONTROL, "no-cache");

        let res = Self::send(req).await?;
        Ok(res.bytes().await?)
    }

    fn authorize(&self, headers: &mut HeaderMap) {
        let Some(token) = &self.config.token else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!("credential is not a valid header value: {e}"),
        }
    }
}
