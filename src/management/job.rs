use std::{
    fmt,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    error::Result,
    types::{ContainerFormat, ContentRef, LeafMetadata},
    utils,
};

/// Length of the random suffix that keeps concurrent temp files apart.
const TEMP_SUFFIX_LEN: usize = 8;

/// Per-leaf pipeline state. Transitions are strictly sequential; `Aborted`
/// is reachable from every state except `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LeafState {
    Classified,
    MetadataFetched,
    FormatSelected,
    KeyAcquired,
    Streamed,
    Decrypted,
    PostProcessed,
    Done,
    Aborted,
}

impl LeafState {
    /// The state that follows `self` on the happy path.
    pub fn next(self) -> Option<LeafState> {
        match self {
            LeafState::Classified => Some(LeafState::MetadataFetched),
            LeafState::MetadataFetched => Some(LeafState::FormatSelected),
            LeafState::FormatSelected => Some(LeafState::KeyAcquired),
            LeafState::KeyAcquired => Some(LeafState::Streamed),
            LeafState::Streamed => Some(LeafState::Decrypted),
            LeafState::Decrypted => Some(LeafState::PostProcessed),
            LeafState::PostProcessed => Some(LeafState::Done),
            LeafState::Done | LeafState::Aborted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LeafState::Done | LeafState::Aborted)
    }
}

impl fmt::Display for LeafState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeafState::Classified => "CLASSIFIED",
            LeafState::MetadataFetched => "METADATA_FETCHED",
            LeafState::FormatSelected => "FORMAT_SELECTED",
            LeafState::KeyAcquired => "KEY_ACQUIRED",
            LeafState::Streamed => "STREAMED",
            LeafState::Decrypted => "DECRYPTED",
            LeafState::PostProcessed => "POST_PROCESSED",
            LeafState::Done => "DONE",
            LeafState::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Everything the pipeline knows about one leaf download.
///
/// Owned by exactly one pipeline run and never shared between concurrent
/// leaves. The temp and part paths carry a random suffix so two leaves that
/// resolve to the same final path never touch each other's scratch files.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub leaf: ContentRef,
    pub metadata: LeafMetadata,
    pub format: ContainerFormat,
    /// `{output_root}/{artist}/{album}`
    pub directory: PathBuf,
    /// Encrypted payload as streamed from the CDN.
    pub temp_path: PathBuf,
    /// Decrypted output before it is promoted to `final_path`.
    pub part_path: PathBuf,
    /// `{directory}/{NN}. {title}.{ext}`
    pub final_path: PathBuf,
    pub state: LeafState,
}

impl DownloadJob {
    /// Builds the job and all of its paths. Nothing touches the filesystem.
    pub fn plan(
        leaf: ContentRef,
        metadata: LeafMetadata,
        format: ContainerFormat,
        output_root: &Path,
    ) -> Self {
        let directory =
            utils::output_directory(output_root, &metadata.artist_name, &metadata.album_name);
        let stem = utils::output_file_stem(metadata.track_number, &metadata.display_name);
        let ext = format.extension();
        let suffix = utils::random_suffix(TEMP_SUFFIX_LEN);

        Self {
            temp_path: directory.join(format!("{stem}.{ext}.{suffix}.tmp")),
            part_path: directory.join(format!("{stem}.{ext}.{suffix}.part")),
            final_path: directory.join(format!("{stem}.{ext}")),
            directory,
            leaf,
            metadata,
            format,
            state: LeafState::FormatSelected,
        }
    }

    /// Moves to the next state on the happy path.
    pub fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            debug!("[{}] {} -> {}", self.leaf.raw_id, self.state, next);
            self.state = next;
        }
    }

    pub fn abort(&mut self) {
        if self.state != LeafState::Done {
            debug!("[{}] {} -> {}", self.leaf.raw_id, self.state, LeafState::Aborted);
            self.state = LeafState::Aborted;
        }
    }
}

/// A scratch file that is removed when dropped unless it was promoted.
///
/// Covers every exit path of the pipeline, including `?` returns and a
/// dropped future on cancellation.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    armed: bool,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the artifact to `to` and disarms the guard.
    pub async fn persist(mut self, to: &Path) -> Result<()> {
        async_fs::rename(&self.path, to).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
