//! The per-leaf download pipeline and its batch driver.
//!
//! For every leaf the [`Downloader`] walks the states of [`LeafState`](crate::management::LeafState) in
//! order: metadata, format selection, key acquisition, streaming, decryption
//! and optional post-processing. Scratch files are held in [`TempArtifact`]
//! guards so that any failure or cancellation between streaming and the final
//! rename leaves nothing behind under the output directory.

use std::{future::Future, path::PathBuf, sync::Arc};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    config::Config,
    decrypt::{DecryptEngine, Mp4Decryptor, OggStreamDecryptor},
    error::{Error, Result},
    management::{BatchReport, DownloadJob, TempArtifact},
    postprocess::{MetadataTagger, PostProcessor, Transcoder},
    spotify::{
        ContainerExpander, ContentDecryptionModule, KeyAcquirer, MetadataFetcher,
        PlayPlayDeobfuscator, StreamFetcher, Transport, reference,
    },
    types::{ContentKind, ContentRef, LeafMetadata},
};

/// Resolves references into decrypted files under the configured output root.
///
/// One instance can serve any number of requests. All collaborators are
/// shared read-only between concurrently running leaves.
pub struct Downloader {
    config: Config,
    metadata: MetadataFetcher,
    expander: ContainerExpander,
    keys: KeyAcquirer,
    storage: StreamFetcher,
    decrypt: DecryptEngine,
    post: PostProcessor,
}

impl Downloader {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        cdm: Arc<dyn ContentDecryptionModule>,
        deobfuscator: Arc<dyn PlayPlayDeobfuscator>,
        mp4: Arc<dyn Mp4Decryptor>,
        ogg: Arc<dyn OggStreamDecryptor>,
    ) -> Self {
        let endpoints = config.endpoints.clone();
        let metadata = MetadataFetcher::new(Arc::clone(&transport), endpoints.clone());

        Self {
            expander: ContainerExpander::new(metadata.clone()),
            keys: KeyAcquirer::new(Arc::clone(&transport), cdm, deobfuscator, endpoints.clone()),
            storage: StreamFetcher::new(transport, endpoints),
            decrypt: DecryptEngine::new(mp4, ogg),
            post: PostProcessor::new(config.convert_to_mp3, config.skip_metadata),
            metadata,
            config,
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.post = self.post.with_transcoder(transcoder);
        self
    }

    pub fn with_tagger(mut self, tagger: Arc<dyn MetadataTagger>) -> Self {
        self.post = self.post.with_tagger(tagger);
        self
    }

    /// Downloads whatever `reference` points at.
    ///
    /// A track or episode reference fails with its own error. Album, playlist
    /// and show references are expanded first; their leaves are processed in
    /// listing order and a failing leaf is logged and recorded in the
    /// returned [`BatchReport`] while the batch moves on. Expansion failures
    /// and cancellation abort the whole request.
    pub async fn download(
        &self,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        let content = reference::classify(reference)?;
        let mut report = BatchReport::default();

        if !content.kind.is_container() {
            let id = content.raw_id.clone();
            let path = self.download_leaf(content, cancel).await.map_err(|e| {
                if e.is_cancelled() { Error::Cancelled } else { e }
            })?;
            report.record(id, Ok(path));
            return Ok(report);
        }

        let ids = cancellable(cancel, self.expander.expand(&content)).await?;
        let leaf_kind = content.kind.leaf_kind();
        info!("Found {} {}(s) in {}", ids.len(), leaf_kind, content);

        let mut results = futures::stream::iter(ids.into_iter().map(move |id| {
            let leaf = ContentRef::new(id, leaf_kind);
            async move {
                let id = leaf.raw_id.clone();
                let outcome = self.download_leaf(leaf, cancel).await;
                (id, outcome)
            }
        }))
        .buffered(self.config.concurrency.max(1));

        while let Some((id, outcome)) = results.next().await {
            match &outcome {
                Ok(path) => debug!("Downloaded [{}] to {}", id, path.display()),
                Err(e) if e.is_cancelled() => {
                    // In-flight leaves remove their scratch files before we return
                    while results.next().await.is_some() {}
                    return Err(Error::Cancelled);
                }
                Err(e) => error!("{}", e),
            }
            report.record(id, outcome);
        }

        info!(
            "Finished {}: {} succeeded, {} failed",
            content,
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    pub async fn download_track(&self, id: &str, cancel: &CancellationToken) -> Result<PathBuf> {
        self.download_leaf(ContentRef::new(id, ContentKind::Track), cancel)
            .await
    }

    pub async fn download_episode(&self, id: &str, cancel: &CancellationToken) -> Result<PathBuf> {
        self.download_leaf(ContentRef::new(id, ContentKind::Episode), cancel)
            .await
    }

    /// Fetches leaf metadata with the track number resolved, without touching
    /// the filesystem or any license server.
    pub async fn resolve_leaf(
        &self,
        leaf: &ContentRef,
        cancel: &CancellationToken,
    ) -> Result<LeafMetadata> {
        cancellable(cancel, self.metadata.resolve_leaf(leaf, self.config.quality)).await
    }

    /// Runs one leaf and wraps any failure with the leaf's name.
    async fn download_leaf(&self, leaf: ContentRef, cancel: &CancellationToken) -> Result<PathBuf> {
        let id = leaf.raw_id.clone();
        let mut name: Option<String> = None;

        let outcome = self.run_leaf(leaf, cancel, &mut name).await;
        outcome.map_err(|e| Error::leaf(&id, name.as_deref(), e))
    }

    async fn run_leaf(
        &self,
        leaf: ContentRef,
        cancel: &CancellationToken,
        name: &mut Option<String>,
    ) -> Result<PathBuf> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!("Processing {}", leaf);
        let metadata = self.resolve_leaf(&leaf, cancel).await?;
        *name = Some(metadata.display_name.clone());
        info!("Downloading {} [{}]", leaf.kind, metadata.display_name);

        let format = self.config.quality.format();
        let mut job = DownloadJob::plan(leaf, metadata, format, &self.config.output_root);

        match self.execute(&mut job, cancel).await {
            Ok(path) => {
                info!("Download {} [{}] successfully", job.leaf.kind, job.metadata.display_name);
                Ok(path)
            }
            Err(e) => {
                job.abort();
                Err(e)
            }
        }
    }

    /// Key acquisition, streaming, decryption, promotion and post-processing.
    async fn execute(&self, job: &mut DownloadJob, cancel: &CancellationToken) -> Result<PathBuf> {
        let file_id = job.metadata.internal_file_ref.clone();

        let key = cancellable(cancel, self.keys.acquire(job.format, &file_id)).await?;
        job.advance();

        let cdn_url = cancellable(cancel, self.storage.resolve_cdn(&file_id)).await?;
        async_fs::create_dir_all(&job.directory).await?;

        let encrypted = TempArtifact::new(&job.temp_path);
        let written = self
            .storage
            .stream_to_file(&cdn_url, encrypted.path(), cancel)
            .await?;
        debug!("Streamed {} byte(s) for [{}]", written, job.leaf.raw_id);
        job.advance();

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let decrypted = self
            .decrypt
            .decrypt(key, encrypted, TempArtifact::new(&job.part_path))
            .await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        decrypted.persist(&job.final_path).await?;
        job.advance();

        let output = self
            .post
            .process(&job.metadata, &job.final_path, &job.directory)
            .await?;
        job.advance();
        job.advance();

        Ok(output)
    }
}

/// Races `fut` against the cancellation signal, checking the signal first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = fut => out,
    }
}
