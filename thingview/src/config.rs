use core::time::Duration;

use url::Url;

use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the gateway lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    /// Bearer credential sent with every request, including media fetches
    /// and the push handshake.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves an href from a description against the gateway.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Ok(self.base_url.join(href)?)
    }

    /// Websocket endpoint for a thing's push channel.
    pub fn push_url(&self, thing_href: &str) -> Result<Url> {
        let mut url = self.resolve(thing_href)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(Error::Protocol(format!("no push channel over {other}"))),
        };

        url.set_scheme(scheme)
            .map_err(|()| Error::Protocol(format!("cannot switch {url} to {scheme}")))?;

        Ok(url)
    }
}
