//! Optional steps run after a leaf has been decrypted: MP3 conversion and
//! metadata tagging.
//!
//! Both are gated on user configuration and on the tool being present. A
//! missing tool is logged and skipped. A failing tool surfaces as
//! [`Error::PostProcess`] but never deletes the decrypted output it started
//! from.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{
    Res,
    error::{Error, Result},
    types::{ContentKind, LeafMetadata},
    utils,
};

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Whether the underlying tool can run right now.
    async fn is_available(&self) -> bool;

    /// Converts `source` into MP3 at `dest`.
    async fn transcode(&self, source: &Path, dest: &Path) -> Res<()>;
}

#[async_trait]
pub trait MetadataTagger: Send + Sync {
    async fn is_available(&self) -> bool;

    /// Writes tags for `metadata` into `file`. `directory` is the leaf's
    /// output directory, for taggers that also drop cover art next to it.
    async fn tag(&self, metadata: &LeafMetadata, file: &Path, directory: &Path) -> Res<()>;
}

/// MP3 conversion through an `ffmpeg` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns a transcoder only if `ffmpeg` is on `PATH`.
    pub fn detect() -> Option<Self> {
        utils::get_binary_path(&["ffmpeg"]).map(Self::new)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn is_available(&self) -> bool {
        self.binary.is_file()
    }

    async fn transcode(&self, source: &Path, dest: &Path) -> Res<()> {
        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-vn", "-codec:a", "libmp3lame", "-q:a", "0"])
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().last().unwrap_or_default();
            return Err(format!("ffmpeg exited with {}: {}", output.status, last_line).into());
        }

        Ok(())
    }
}

/// Runs the enabled post-processing steps for one leaf.
#[derive(Clone, Default)]
pub struct PostProcessor {
    transcoder: Option<Arc<dyn Transcoder>>,
    tagger: Option<Arc<dyn MetadataTagger>>,
    convert_to_mp3: bool,
    skip_metadata: bool,
}

impl PostProcessor {
    pub fn new(convert_to_mp3: bool, skip_metadata: bool) -> Self {
        Self {
            convert_to_mp3,
            skip_metadata,
            ..Default::default()
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn with_tagger(mut self, tagger: Arc<dyn MetadataTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Post-processes the decrypted file at `output` and returns the path of
    /// the file the leaf finally ended up in.
    pub async fn process(
        &self,
        metadata: &LeafMetadata,
        output: &Path,
        directory: &Path,
    ) -> Result<PathBuf> {
        let mut output = output.to_path_buf();

        if self.convert_to_mp3 {
            output = self.convert(output).await?;
        }

        if self.should_tag(metadata, &output) {
            match &self.tagger {
                Some(tagger) if tagger.is_available().await => {
                    tagger
                        .tag(metadata, &output, directory)
                        .await
                        .map_err(|source| Error::PostProcess {
                            stage: "tag",
                            source,
                        })?;
                    debug!("Tagged {}", output.display());
                }
                _ => warn!(
                    "No metadata tagger available, skipping tags for {}",
                    output.display()
                ),
            }
        }

        Ok(output)
    }

    async fn convert(&self, source: PathBuf) -> Result<PathBuf> {
        let Some(transcoder) = &self.transcoder else {
            warn!("ffmpeg not found, keeping {}", source.display());
            return Ok(source);
        };
        if !transcoder.is_available().await {
            warn!("Transcoder unavailable, keeping {}", source.display());
            return Ok(source);
        }

        let dest = source.with_extension("mp3");
        if let Err(source_err) = transcoder.transcode(&source, &dest).await {
            if async_fs::remove_file(&dest).await.is_ok() {
                debug!("Removed partial {}", dest.display());
            }
            return Err(Error::PostProcess {
                stage: "transcode",
                source: source_err,
            });
        }

        async_fs::remove_file(&source).await?;
        debug!("Converted {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    fn should_tag(&self, metadata: &LeafMetadata, output: &Path) -> bool {
        if self.skip_metadata || metadata.kind != ContentKind::Track {
            return false;
        }
        matches!(
            output.extension().and_then(|e| e.to_str()),
            Some("mp3") | Some("m4a")
        )
    }
}
