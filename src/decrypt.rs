//! Turns an encrypted temp file into a playable media file.

use std::{path::Path, sync::Arc};

use tracing::debug;

use crate::{
    Res,
    error::{Error, Result},
    management::TempArtifact,
    types::{ContentKey, DecryptionKey},
};

/// Box-level MP4 (CENC) decryption. Picks the key per sample group by key ID.
pub trait Mp4Decryptor: Send + Sync {
    fn decrypt_container(&self, source: &Path, keys: &[ContentKey], dest: &Path) -> Res<()>;
}

/// Whole-payload stream decryption with a single 16-byte key.
pub trait OggStreamDecryptor: Send + Sync {
    fn decrypt_stream(&self, key: &[u8; 16], source: &Path, dest: &Path) -> Res<()>;
}

/// Dispatches to the capability matching the key's format.
///
/// Both capabilities are blocking; they run on the blocking pool so large MP4
/// files never stall the async workers.
#[derive(Clone)]
pub struct DecryptEngine {
    mp4: Arc<dyn Mp4Decryptor>,
    ogg: Arc<dyn OggStreamDecryptor>,
}

impl DecryptEngine {
    pub fn new(mp4: Arc<dyn Mp4Decryptor>, ogg: Arc<dyn OggStreamDecryptor>) -> Self {
        Self { mp4, ogg }
    }

    /// Decrypts `source` into `dest` and hands `dest` back for promotion.
    ///
    /// Both guards move onto the blocking task. `source` is removed once the
    /// capability returns and `dest` is removed on failure, so neither file
    /// outlives the decryption even when the awaiting future is dropped.
    pub async fn decrypt(
        &self,
        key: DecryptionKey,
        source: TempArtifact,
        dest: TempArtifact,
    ) -> Result<TempArtifact> {
        let format = key.format();
        let mp4 = Arc::clone(&self.mp4);
        let ogg = Arc::clone(&self.ogg);

        debug!("Decrypting {} -> {}", source.path().display(), dest.path().display());

        let outcome = tokio::task::spawn_blocking(move || {
            let result = match key {
                DecryptionKey::Mp4(keys) => mp4.decrypt_container(source.path(), &keys, dest.path()),
                DecryptionKey::Ogg(key) => ogg.decrypt_stream(&key, source.path(), dest.path()),
            };
            drop(source);
            result.map(|()| dest)
        })
        .await;

        match outcome {
            Ok(Ok(dest)) => Ok(dest),
            Ok(Err(source)) => Err(Error::Decrypt { format, source }),
            Err(join_error) => Err(Error::Decrypt {
                format,
                source: Box::new(join_error),
            }),
        }
    }
}

impl std::fmt::Debug for DecryptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptEngine").finish_non_exhaustive()
    }
}
