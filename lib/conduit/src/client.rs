//! Transport stage backed by hyper-util.

use std::fmt;

use bytes::Bytes;
use conduit_core::header::USER_AGENT;
use conduit_core::{Error, Request, Response, Result, Stage};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tracing::debug;

use crate::TransportConfig;
use crate::connector::https_connector;

/// Stage that sends a [`Request`] over the network and buffers the [`Response`].
///
/// Connections are pooled and shared by clones. The request must have a
/// host, usually filled by the server environment stage. Non-2xx statuses
/// are successful responses here.
///
/// # Example
///
/// ```no_run
/// use conduit::prelude::*;
///
/// # async fn demo() -> conduit::Result<()> {
/// let pipeline = HyperClient::new()?
///     .apply_server_environment(Some(ServerEnvironment::new().host("api.example.com")))
///     .validated();
///
/// let response = pipeline.run(Request::new(Method::Get, "/users")).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns a TLS error if the TLS configuration cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Client with `config`.
    ///
    /// # Errors
    ///
    /// Returns a TLS error if the TLS configuration cannot be built.
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let inner = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config)?);
        Ok(Self { inner, config })
    }

    /// Transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn to_hyper(&self, request: &Request) -> Result<http::Request<Full<Bytes>>> {
        let mut outgoing = request.to_http()?.map(Full::new);
        if let Some(user_agent) = &self.config.user_agent {
            outgoing
                .headers_mut()
                .entry(USER_AGENT)
                .or_insert_with(|| user_agent.clone());
        }
        Ok(outgoing)
    }

    async fn exchange(&self, request: Request) -> Result<Response> {
        let outgoing = self.to_hyper(&request)?;
        let incoming = self.inner.request(outgoing).await.map_err(map_hyper_error)?;

        let (parts, body) = incoming.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(request, parts.status.as_u16(), parts.headers, body))
    }
}

impl Stage for HyperClient {
    type Input = Request;
    type Output = Response;

    async fn run(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), path = request.path(), "sending request");
        tokio::time::timeout(self.config.timeout, self.exchange(request))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    let message = err.to_string();
    let detail = std::error::Error::source(&err)
        .map(ToString::to_string)
        .unwrap_or_default()
        .to_lowercase();

    if ["tls", "ssl", "certificate"]
        .iter()
        .any(|marker| detail.contains(marker))
    {
        Error::tls(format!("{message}: {detail}"))
    } else if err.is_connect() {
        Error::connection(format!("{message}: {detail}"))
    } else {
        Error::connection(message)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert2::{check, let_assert};
    use conduit_core::Method;

    use super::*;

    #[test]
    fn client_keeps_config() {
        let config = TransportConfig::builder()
            .timeout(Duration::from_secs(3))
            .build();
        let client = HyperClient::with_config(config).expect("client");

        check!(client.config().timeout == Duration::from_secs(3));
        check!(format!("{client:?}").contains("HyperClient"));
    }

    #[test]
    fn default_user_agent_is_added() {
        let client = HyperClient::new().expect("client");
        let request = Request::builder(Method::Get)
            .url("http://localhost/")
            .build()
            .expect("valid");

        let outgoing = client.to_hyper(&request).expect("convert");
        check!(outgoing.headers().get(USER_AGENT).is_some());
    }

    #[test]
    fn request_user_agent_wins() {
        let client = HyperClient::new().expect("client");
        let request = Request::builder(Method::Get)
            .url("http://localhost/")
            .header("user-agent", "custom/1.0")
            .build()
            .expect("valid");

        let outgoing = client.to_hyper(&request).expect("convert");
        check!(outgoing.headers().get(USER_AGENT).map(|v| v.as_bytes()) == Some(&b"custom/1.0"[..]));
    }

    #[tokio::test]
    async fn request_without_host_is_rejected() {
        let client = HyperClient::new().expect("client");
        let_assert!(
            Err(Error::InvalidUrl(_)) = client.run(Request::new(Method::Get, "/relative")).await
        );
    }
}
