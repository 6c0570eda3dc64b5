use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Track,
    Episode,
    Album,
    Playlist,
    Show,
}

impl ContentKind {
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ContentKind::Album | ContentKind::Playlist | ContentKind::Show
        )
    }

    /// The kind of leaf a container expands into. Leaves map to themselves.
    pub fn leaf_kind(self) -> ContentKind {
        match self {
            ContentKind::Album | ContentKind::Playlist | ContentKind::Track => ContentKind::Track,
            ContentKind::Show | ContentKind::Episode => ContentKind::Episode,
        }
    }

    /// Listing page size for containers.
    pub fn page_size(self) -> Option<usize> {
        match self {
            ContentKind::Album | ContentKind::Show => Some(50),
            ContentKind::Playlist => Some(100),
            ContentKind::Track | ContentKind::Episode => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Track => "track",
            ContentKind::Episode => "episode",
            ContentKind::Album => "album",
            ContentKind::Playlist => "playlist",
            ContentKind::Show => "show",
        };
        f.write_str(name)
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(ContentKind::Track),
            "episode" => Ok(ContentKind::Episode),
            "album" => Ok(ContentKind::Album),
            "playlist" => Ok(ContentKind::Playlist),
            "show" => Ok(ContentKind::Show),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

/// A classified reference: the base62 ID plus what it points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentRef {
    pub raw_id: String,
    pub kind: ContentKind,
}

impl ContentRef {
    pub fn new(raw_id: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            raw_id: raw_id.into(),
            kind,
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spotify:{}:{}", self.kind, self.raw_id)
    }
}

/// Container format of the downloaded payload, which also decides the
/// license protocol used to obtain its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Widevine protected.
    Mp4,
    /// PlayPlay protected.
    Ogg,
}

impl ContainerFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "m4a",
            ContainerFormat::Ogg => "ogg",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFormat::Mp4 => f.write_str("MP4"),
            ContainerFormat::Ogg => f.write_str("OGG"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    #[default]
    Mp4_128,
    Mp4_256,
    Mp4_128Dual,
    Mp4_256Dual,
    OggVorbis96,
    OggVorbis160,
    OggVorbis320,
}

impl Quality {
    pub const ALL: [Quality; 7] = [
        Quality::Mp4_128,
        Quality::Mp4_256,
        Quality::Mp4_128Dual,
        Quality::Mp4_256Dual,
        Quality::OggVorbis96,
        Quality::OggVorbis160,
        Quality::OggVorbis320,
    ];

    pub fn format(self) -> ContainerFormat {
        match self {
            Quality::Mp4_128 | Quality::Mp4_256 | Quality::Mp4_128Dual | Quality::Mp4_256Dual => {
                ContainerFormat::Mp4
            }
            Quality::OggVorbis96 | Quality::OggVorbis160 | Quality::OggVorbis320 => {
                ContainerFormat::Ogg
            }
        }
    }

    /// The `format` value used by file entries in leaf metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Mp4_128 => "MP4_128",
            Quality::Mp4_256 => "MP4_256",
            Quality::Mp4_128Dual => "MP4_128_DUAL",
            Quality::Mp4_256Dual => "MP4_256_DUAL",
            Quality::OggVorbis96 => "OGG_VORBIS_96",
            Quality::OggVorbis160 => "OGG_VORBIS_160",
            Quality::OggVorbis320 => "OGG_VORBIS_320",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == wanted)
            .ok_or_else(|| format!("unsupported quality: {s}"))
    }
}

/// Hex-encoded 20-byte audio file identifier used by the CDN and license servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    hex: String,
    bytes: [u8; 20],
}

impl FileId {
    pub fn parse(hex_id: &str) -> Option<Self> {
        let lower = hex_id.to_ascii_lowercase();
        let bytes: [u8; 20] = hex::decode(&lower).ok()?.try_into().ok()?;
        Some(Self { hex: lower, bytes })
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn bytes(&self) -> [u8; 20] {
        self.bytes
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Metadata for a single leaf, fetched once and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafMetadata {
    pub kind: ContentKind,
    pub display_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub track_number: u32,
    pub internal_file_ref: FileId,
    pub raw_gid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKey {
    pub kid: Vec<u8>,
    pub key: Vec<u8>,
}

/// Key material for one leaf, tagged by the protocol that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptionKey {
    Mp4(Vec<ContentKey>),
    Ogg([u8; 16]),
}

impl DecryptionKey {
    pub fn format(&self) -> ContainerFormat {
        match self {
            DecryptionKey::Mp4(_) => ContainerFormat::Mp4,
            DecryptionKey::Ogg(_) => ContainerFormat::Ogg,
        }
    }
}

// Wire shapes of the metadata and Web API endpoints.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFile {
    pub file_id: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeTrack {
    #[serde(default)]
    pub file: Vec<AudioFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadataResponse {
    pub gid: String,
    pub name: String,
    pub album: NamedRef,
    #[serde(default)]
    pub artist: Vec<NamedRef>,
    #[serde(default)]
    pub file: Vec<AudioFile>,
    #[serde(default)]
    pub alternative: Vec<AlternativeTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeMetadataResponse {
    pub gid: String,
    pub name: String,
    pub show: ShowRef,
    #[serde(default)]
    pub audio: Vec<AudioFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDetail {
    pub track_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdItem {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<IdItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageResolveResponse {
    #[serde(default)]
    pub cdnurl: Vec<String>,
}

#[derive(Tabled)]
pub struct PlanTableRow {
    #[tabled(rename = "#")]
    pub number: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub path: String,
}
