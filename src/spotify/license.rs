//! Content key acquisition.
//!
//! Two license protocols are supported and picked by [`ContainerFormat`]:
//!
//! - **MP4 (Widevine)**: PSSH lookup → CDM challenge → license POST → CDM parses
//!   the license into the key set.
//! - **OGG (PlayPlay)**: protobuf license request → license POST → obfuscated
//!   key → deobfuscation seeded with the file ID.
//!
//! The CDM and the deobfuscation function are host-provided capabilities; this
//! module only drives the exchanges.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use prost::Message;
use reqwest::Method;
use tracing::debug;

use crate::{
    Res,
    config::Endpoints,
    error::{Error, KeyStep, Result},
    spotify::{
        playplay::{PlayPlayLicenseRequest, PlayPlayLicenseResponse},
        transport::Transport,
    },
    types::{ContainerFormat, ContentKey, DecryptionKey, FileId},
};

/// Consumes a raw license response and yields the content keys it carries.
pub type LicenseParser = Box<dyn FnOnce(&[u8]) -> Res<Vec<ContentKey>> + Send>;

/// A Widevine-style content decryption module.
///
/// Device state is shared read-only between concurrent leaf downloads.
pub trait ContentDecryptionModule: Send + Sync {
    /// Builds a license challenge for `pssh` and returns it together with the
    /// parser for the matching license response.
    fn license_challenge(&self, pssh: &[u8]) -> Res<(Vec<u8>, LicenseParser)>;
}

/// The PlayPlay key deobfuscation capability.
pub trait PlayPlayDeobfuscator: Send + Sync {
    /// Static client token embedded in every license request.
    fn client_token(&self) -> Vec<u8>;

    /// Recovers the content key. Must be a pure function of its inputs.
    fn deobfuscate(&self, obfuscated_key: [u8; 16], file_id: [u8; 20]) -> Res<[u8; 16]>;
}

/// Runs the license exchange for one leaf.
#[derive(Clone)]
pub struct KeyAcquirer {
    transport: Arc<dyn Transport>,
    cdm: Arc<dyn ContentDecryptionModule>,
    deobfuscator: Arc<dyn PlayPlayDeobfuscator>,
    endpoints: Endpoints,
}

impl KeyAcquirer {
    pub fn new(
        transport: Arc<dyn Transport>,
        cdm: Arc<dyn ContentDecryptionModule>,
        deobfuscator: Arc<dyn PlayPlayDeobfuscator>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            cdm,
            deobfuscator,
            endpoints,
        }
    }

    pub async fn acquire(&self, format: ContainerFormat, file_id: &FileId) -> Result<DecryptionKey> {
        match format {
            ContainerFormat::Mp4 => {
                let pssh = self.request_pssh(file_id).await?;
                debug!("Request PSSH for [{}] successfully: {}", file_id, pssh);

                let keys = self.mp4_keys(&pssh).await?;
                debug!("Get {} decrypt key(s) for [{}] successfully", keys.len(), file_id);
                Ok(DecryptionKey::Mp4(keys))
            }
            ContainerFormat::Ogg => Ok(DecryptionKey::Ogg(self.ogg_key(file_id).await?)),
        }
    }

    /// Looks up the base64 PSSH for a file. A response without a `pssh`
    /// string is an error.
    pub async fn request_pssh(&self, file_id: &FileId) -> Result<String> {
        let fail = |message: String| Error::key(ContainerFormat::Mp4, KeyStep::PsshLookup, message);

        let url = format!(
            "{base}/seektable/{file_id}.json",
            base = self.endpoints.seektable,
            file_id = file_id
        );
        let data = self
            .transport
            .request(Method::GET, &url, None)
            .await
            .map_err(|e| fail(format!("failed to request PSSH: {}", e)))?;

        let result: serde_json::Value = serde_json::from_slice(&data)
            .map_err(|e| fail(format!("failed to request PSSH: {}", e)))?;

        match result.get("pssh").and_then(|v| v.as_str()) {
            Some(pssh) if !pssh.is_empty() => Ok(pssh.to_string()),
            _ => {
                debug!("Failed to find PSSH: {}", result);
                Err(fail("PSSH not found".to_string()))
            }
        }
    }

    async fn mp4_keys(&self, pssh_b64: &str) -> Result<Vec<ContentKey>> {
        let fail = |step: KeyStep, message: String| Error::key(ContainerFormat::Mp4, step, message);

        let pssh = STANDARD
            .decode(pssh_b64)
            .map_err(|e| fail(KeyStep::Challenge, format!("parse pssh failed: {}", e)))?;

        let (challenge, parse_license) = self
            .cdm
            .license_challenge(&pssh)
            .map_err(|e| fail(KeyStep::Challenge, format!("get license challenge failed: {}", e)))?;

        let license = self
            .transport
            .request(
                Method::POST,
                &self.endpoints.widevine_license,
                Some(challenge),
            )
            .await
            .map_err(|e| fail(KeyStep::LicenseRequest, format!("request license failed: {}", e)))?;

        let keys = parse_license(&license)
            .map_err(|e| fail(KeyStep::LicenseParse, format!("parse license failed: {}", e)))?;

        if keys.is_empty() {
            return Err(fail(
                KeyStep::LicenseParse,
                "license carried no content keys".to_string(),
            ));
        }

        Ok(keys)
    }

    async fn ogg_key(&self, file_id: &FileId) -> Result<[u8; 16]> {
        let fail = |step: KeyStep, message: String| Error::key(ContainerFormat::Ogg, step, message);

        let request = PlayPlayLicenseRequest::interactive_track(self.deobfuscator.client_token());
        let body = request.encode_to_vec();

        let url = format!(
            "{base}/playplay/v1/key/{file_id}",
            base = self.endpoints.spclient,
            file_id = file_id
        );
        let response = self
            .transport
            .request(Method::POST, &url, Some(body))
            .await
            .map_err(|e| fail(KeyStep::LicenseRequest, format!("request license failed: {}", e)))?;

        let response = PlayPlayLicenseResponse::decode(response.as_ref())
            .map_err(|e| fail(KeyStep::ResponseDecode, format!("parse response failed: {}", e)))?;

        let obfuscated_key: [u8; 16] = response
            .obfuscated_key
            .unwrap_or_default()
            .try_into()
            .map_err(|key: Vec<u8>| {
                fail(
                    KeyStep::ResponseDecode,
                    format!("expected a 16-byte obfuscated key, got {} byte(s)", key.len()),
                )
            })?;

        debug!("[OGG Crypt] file id: {}", file_id);
        debug!("[OGG Crypt] obfuscated key: {}", hex::encode(obfuscated_key));

        let key = self
            .deobfuscator
            .deobfuscate(obfuscated_key, file_id.bytes())
            .map_err(|e| fail(KeyStep::Deobfuscate, e.to_string()))?;

        debug!("[OGG Crypt] key deobfuscated for [{}]", file_id);
        Ok(key)
    }
}
