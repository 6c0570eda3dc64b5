//! # Spotify Integration Module
//!
//! This module is the integration layer between the download pipeline and
//! Spotify's services. Every remote round trip the pipeline makes goes through
//! one of the components here, and all of them share a single [`Transport`].
//!
//! ## Architecture
//!
//! ```text
//! Pipeline Orchestrator (management::Downloader)
//!          ↓
//! Spotify Integration Layer
//!     ├── Reference classification (URLs, URIs, bare IDs)
//!     ├── Metadata (leaf metadata, track detail, container listings)
//!     ├── Container expansion (offset/limit pagination)
//!     ├── License exchange (Widevine for MP4, PlayPlay for OGG)
//!     └── Storage (CDN resolution, streaming download)
//!          ↓
//! Transport (reqwest, bearer token, per-request timeout)
//!          ↓
//! Web API / spclient / seektables / CDN
//! ```
//!
//! ## Core Modules
//!
//! - [`reference`] - Parses user input into a [`ContentRef`](crate::types::ContentRef)
//! - [`metadata`] - JSON metadata endpoints for tracks, episodes and listings
//! - [`expander`] - Turns albums, playlists and shows into ordered leaf IDs
//! - [`license`] - Drives both license protocols against host-provided DRM capabilities
//! - [`playplay`] - Protobuf messages of the PlayPlay license endpoint
//! - [`storage`] - Storage resolution and chunked copy of encrypted payloads
//! - [`transport`] - The request execution seam and its `reqwest` implementation
//!
//! ## Error Handling
//!
//! Nothing in this layer retries. Transport failures and non-2xx responses are
//! [`Error::Upstream`](crate::Error::Upstream), malformed bodies are
//! [`Error::Decode`](crate::Error::Decode) and license failures are
//! [`Error::KeyAcquisition`](crate::Error::KeyAcquisition) tagged with the
//! format and the failing step.
//!
//! ## API Coverage
//!
//! - `GET {spclient}/metadata/4/{track|episode}/{gid}` - Leaf metadata
//! - `GET {web_api}/tracks/{id}` - Track number
//! - `GET {web_api}/albums/{id}/tracks` - Album listing (50 per page)
//! - `GET {web_api}/playlists/{id}/tracks` - Playlist listing (100 per page)
//! - `GET {web_api}/shows/{id}/episodes` - Show listing (50 per page)
//! - `GET {spclient}/storage-resolve/files/audio/interactive/{file_id}` - CDN URLs
//! - `GET {seektable}/seektable/{file_id}.json` - PSSH lookup
//! - `POST {widevine_license}` - Widevine license
//! - `POST {spclient}/playplay/v1/key/{file_id}` - PlayPlay license

pub mod expander;
pub mod license;
pub mod metadata;
pub mod playplay;
pub mod reference;
pub mod storage;
pub mod transport;

pub use expander::ContainerExpander;
pub use license::{ContentDecryptionModule, KeyAcquirer, LicenseParser, PlayPlayDeobfuscator};
pub use metadata::{ListingPage, MetadataFetcher};
pub use reference::classify;
pub use storage::StreamFetcher;
pub use transport::{ByteStream, HttpTransport, Transport};
