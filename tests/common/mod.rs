#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use futures::{StreamExt, stream};
use reqwest::Method;
use spdl::{
    ContentDecryptionModule, Mp4Decryptor, OggStreamDecryptor, PlayPlayDeobfuscator, Res,
    config::Config,
    error::{Error, Result},
    management::Downloader,
    spotify::{ByteStream, LicenseParser, Transport},
    types::ContentKey,
    utils,
};

pub const LICENSE_BODY: &[u8] = b"widevine-license";
pub const PSSH_BYTES: &[u8] = b"pssh-box";
pub const CLIENT_TOKEN: &[u8] = b"client-token";
pub const PAYLOAD: [&[u8]; 3] = [b"encrypted-", b"audio-", b"payload"];

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
}

#[derive(Clone)]
enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

#[derive(Clone)]
enum StreamReply {
    Chunks(Vec<Vec<u8>>),
    /// Yields the chunks, then never finishes.
    Hang(Vec<Vec<u8>>),
}

/// In-memory transport. Routes match when their pattern is a substring of
/// the request URL; the first registered match wins.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<(String, Reply)>>,
    streams: Mutex<Vec<(String, StreamReply)>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, pattern: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.into(), Reply::Body(body.into())));
    }

    pub fn respond_json(&self, pattern: impl Into<String>, value: serde_json::Value) {
        self.respond(pattern, value.to_string());
    }

    pub fn fail(&self, pattern: impl Into<String>, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.into(), Reply::Status(status)));
    }

    pub fn stream_chunks(&self, pattern: impl Into<String>, chunks: &[&[u8]]) {
        self.streams.lock().unwrap().push((
            pattern.into(),
            StreamReply::Chunks(chunks.iter().map(|c| c.to_vec()).collect()),
        ));
    }

    pub fn stream_hang(&self, pattern: impl Into<String>, chunks: &[&[u8]]) {
        self.streams.lock().unwrap().push((
            pattern.into(),
            StreamReply::Hang(chunks.iter().map(|c| c.to_vec()).collect()),
        ));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<Bytes> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            body,
        });

        let reply = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Body(body)) => Ok(Bytes::from(body)),
            Some(Reply::Status(status)) => Err(Error::Upstream {
                url: url.to_string(),
                status: Some(status),
                message: "fake failure".to_string(),
            }),
            None => Err(Error::Upstream {
                url: url.to_string(),
                status: Some(404),
                message: "no fake route".to_string(),
            }),
        }
    }

    async fn stream(&self, url: &str) -> Result<ByteStream> {
        self.calls.lock().unwrap().push(Call {
            method: Method::GET,
            url: url.to_string(),
            body: None,
        });

        let reply = self
            .streams
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(StreamReply::Chunks(chunks)) => Ok(stream::iter(
                chunks.into_iter().map(|c| Ok(Bytes::from(c))),
            )
            .boxed()),
            Some(StreamReply::Hang(chunks)) => Ok(stream::iter(
                chunks.into_iter().map(|c| Ok(Bytes::from(c))),
            )
            .chain(stream::pending::<Result<Bytes>>())
            .boxed()),
            None => Err(Error::Upstream {
                url: url.to_string(),
                status: Some(404),
                message: "no fake stream".to_string(),
            }),
        }
    }
}

/// Returns the keys when the license equals [`LICENSE_BODY`]. With `reject`
/// set it refuses to build a challenge.
#[derive(Default)]
pub struct FakeCdm {
    pub reject: bool,
    pub challenges: AtomicUsize,
}

impl FakeCdm {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn keys() -> Vec<ContentKey> {
        vec![
            ContentKey {
                kid: vec![0x01; 16],
                key: vec![0xaa; 16],
            },
            ContentKey {
                kid: vec![0x02; 16],
                key: vec![0xbb; 16],
            },
        ]
    }
}

impl ContentDecryptionModule for FakeCdm {
    fn license_challenge(&self, pssh: &[u8]) -> Res<(Vec<u8>, LicenseParser)> {
        self.challenges.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err("device revoked".into());
        }
        if pssh != PSSH_BYTES {
            return Err("unexpected pssh".into());
        }

        let mut challenge = b"challenge:".to_vec();
        challenge.extend_from_slice(pssh);

        let parser: LicenseParser = Box::new(|license: &[u8]| {
            if license == LICENSE_BODY {
                Ok(FakeCdm::keys())
            } else {
                Err("license rejected".into())
            }
        });
        Ok((challenge, parser))
    }
}

/// XORs the obfuscated key with the first 16 bytes of the file ID.
#[derive(Default)]
pub struct FakeDeobfuscator;

impl FakeDeobfuscator {
    pub fn expected(obfuscated: [u8; 16], file_id: [u8; 20]) -> [u8; 16] {
        let mut key = obfuscated;
        for (k, f) in key.iter_mut().zip(file_id.iter()) {
            *k ^= f;
        }
        key
    }
}

impl PlayPlayDeobfuscator for FakeDeobfuscator {
    fn client_token(&self) -> Vec<u8> {
        CLIENT_TOKEN.to_vec()
    }

    fn deobfuscate(&self, obfuscated_key: [u8; 16], file_id: [u8; 20]) -> Res<[u8; 16]> {
        Ok(Self::expected(obfuscated_key, file_id))
    }
}

/// Prefixes the payload with a marker. With `fail` set it leaves a partial
/// destination behind and errors. With `delay` set it blocks between reading
/// the source and writing the destination.
#[derive(Default)]
pub struct FakeDecryptor {
    pub fail: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FakeDecryptor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn run(&self, marker: &str, source: &Path, dest: &Path) -> Res<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = std::fs::read(source)?;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.fail {
            std::fs::write(dest, b"partial")?;
            return Err("corrupt sample group".into());
        }

        let mut out = marker.as_bytes().to_vec();
        out.extend_from_slice(&payload);
        std::fs::write(dest, out)?;
        Ok(())
    }
}

impl Mp4Decryptor for FakeDecryptor {
    fn decrypt_container(&self, source: &Path, keys: &[ContentKey], dest: &Path) -> Res<()> {
        if keys != FakeCdm::keys().as_slice() {
            return Err("wrong key set".into());
        }
        self.run("mp4:", source, dest)
    }
}

impl OggStreamDecryptor for FakeDecryptor {
    fn decrypt_stream(&self, _key: &[u8; 16], source: &Path, dest: &Path) -> Res<()> {
        self.run("ogg:", source, dest)
    }
}

/// `n` rendered as a 22-character base62 ID.
pub fn leaf_id(n: u32) -> String {
    format!("{:0>22}", n)
}

pub fn file_id(n: u32) -> String {
    format!("{:040x}", n)
}

/// Registers metadata, track number, PSSH, license, CDN and payload routes
/// for one MP4 track.
pub fn register_track(transport: &FakeTransport, n: u32, title: &str, artist: &str, album: &str) {
    let id = leaf_id(n);
    let gid = utils::base62_to_hex(&id).unwrap();
    let file = file_id(n);

    transport.respond_json(
        format!("/metadata/4/track/{gid}"),
        serde_json::json!({
            "gid": gid,
            "name": title,
            "album": { "name": album },
            "artist": [{ "name": artist }],
            "file": [
                { "file_id": file_id(n + 1000), "format": "OGG_VORBIS_160" },
                { "file_id": file, "format": "MP4_128" }
            ]
        }),
    );
    transport.respond_json(
        format!("/tracks/{id}"),
        serde_json::json!({ "track_number": n }),
    );
    register_file(transport, &file);
}

/// PSSH, CDN resolution and payload routes for a file ID.
pub fn register_file(transport: &FakeTransport, file: &str) {
    transport.respond_json(
        format!("/seektable/{file}.json"),
        serde_json::json!({ "pssh": STANDARD.encode(PSSH_BYTES) }),
    );
    transport.respond_json(
        format!("/storage-resolve/files/audio/interactive/{file}"),
        serde_json::json!({ "cdnurl": [format!("https://audio.cdn.test/audio/{file}")] }),
    );
    transport.stream_chunks(format!("audio.cdn.test/audio/{file}"), &PAYLOAD);
}

pub fn register_widevine(transport: &FakeTransport) {
    transport.respond("widevine-license", LICENSE_BODY);
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub cdm: Arc<FakeCdm>,
    pub mp4: Arc<FakeDecryptor>,
    pub ogg: Arc<FakeDecryptor>,
    pub root: PathBuf,
}

impl Harness {
    pub fn new(root: &Path) -> Self {
        Self::with_decryptor(root, FakeDecryptor::default())
    }

    pub fn with_decryptor(root: &Path, mp4: FakeDecryptor) -> Self {
        Self {
            transport: FakeTransport::new(),
            cdm: Arc::new(FakeCdm::default()),
            mp4: Arc::new(mp4),
            ogg: Arc::new(FakeDecryptor::default()),
            root: root.to_path_buf(),
        }
    }

    pub fn config(&self) -> Config {
        Config::new("test-token", &self.root)
    }

    pub fn downloader(&self, config: Config) -> Downloader {
        Downloader::new(
            config,
            self.transport.clone(),
            self.cdm.clone(),
            Arc::new(FakeDeobfuscator),
            self.mp4.clone(),
            self.ogg.clone(),
        )
    }
}

/// Every file below `root`, recursively.
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}
