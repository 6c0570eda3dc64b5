use std::{path::Path, sync::Arc};

use futures::{AsyncWriteExt, StreamExt};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::Endpoints,
    error::{Error, Result},
    spotify::transport::Transport,
    types::{FileId, StorageResolveResponse},
};

/// Resolves CDN locations and copies encrypted payloads to disk.
#[derive(Clone)]
pub struct StreamFetcher {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
}

impl StreamFetcher {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub async fn resolve_cdn(&self, file_id: &FileId) -> Result<String> {
        let url = format!(
            "{base}/storage-resolve/files/audio/interactive/{file_id}?alt=json",
            base = self.endpoints.spclient,
            file_id = file_id
        );
        let data = self.transport.request(Method::GET, &url, None).await?;
        let resolved: StorageResolveResponse =
            serde_json::from_slice(&data).map_err(|e| Error::decode("storage resolve", e))?;

        resolved
            .cdnurl
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream(url, "no CDN URL returned"))
    }

    /// Streams `url` into `dest` chunk by chunk and returns the bytes written.
    ///
    /// The payload is never held in memory as a whole. On failure or
    /// cancellation a partially written `dest` is left for the caller to
    /// remove.
    pub async fn stream_to_file(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            stream = self.transport.stream(url) => stream?,
        };

        let mut file = async_fs::File::create(dest).await?;
        let mut written: u64 = 0;

        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(chunk) => {
                    let chunk = chunk?;
                    file.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                None => break,
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        debug!("Wrote {} byte(s) to {}", written, dest.display());

        Ok(written)
    }
}
