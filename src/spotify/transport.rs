use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use reqwest::{
    Client, Method,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

use crate::{
    config::Config,
    error::{Error, Result},
};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

/// A stream of body chunks from a download.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Authenticated request execution shared by every component.
///
/// Implementations own session state (tokens, connection pools, timeouts).
/// Non-2xx responses must be reported as [`Error::Upstream`] with the status.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes a request and returns the full response body.
    async fn request(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<Bytes>;

    /// Opens a GET request and returns its body as a stream of chunks.
    async fn stream(&self, url: &str) -> Result<ByteStream>;
}

/// [`Transport`] backed by a `reqwest` client with a bearer token.
pub struct HttpTransport {
    client: Client,
    access_token: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("App-Platform", HeaderValue::from_static("WebPlayer"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.metadata_language)
                .map_err(|e| Error::Config(format!("invalid metadata language: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.request_timeout)
            .read_timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            access_token: config.access_token.clone(),
            timeout: config.request_timeout,
        })
    }

    async fn send(&self, builder: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::upstream(url, e))?;

        match response.error_for_status() {
            Ok(valid_response) => Ok(valid_response),
            Err(err) => Err(Error::Upstream {
                url: url.to_string(),
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<Bytes> {
        debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = self.send(builder, url).await?;
        response.bytes().await.map_err(|e| Error::upstream(url, e))
    }

    async fn stream(&self, url: &str) -> Result<ByteStream> {
        debug!("GET (stream) {}", url);

        // CDN URLs are pre-signed; no bearer token. Only stalls time out, not
        // the whole transfer.
        let response = self.send(self.client.get(url), url).await?;
        let owned_url = url.to_string();
        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| Error::upstream(owned_url.clone(), e)));

        Ok(stream.boxed())
    }
}
