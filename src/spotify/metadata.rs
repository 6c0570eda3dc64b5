use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::Endpoints,
    error::{Error, Result},
    spotify::transport::Transport,
    types::{
        AudioFile, ContentKind, ContentRef, EpisodeMetadataResponse, FileId, IdItem, LeafMetadata,
        Paging, PlaylistItem, Quality, TrackDetail, TrackMetadataResponse,
    },
    utils,
};

/// One page of a container listing.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Leaf IDs in listing order. Unavailable entries are omitted.
    pub ids: Vec<String>,
    /// Raw number of entries the page carried, including unavailable ones.
    pub item_count: usize,
    /// Whether the upstream paging object points at a further page.
    pub has_next: bool,
}

/// Retrieves leaf metadata and container listings.
///
/// No retries happen here; a failed request surfaces as
/// [`Error::Upstream`] and a malformed body as [`Error::Decode`].
#[derive(Clone)]
pub struct MetadataFetcher {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
}

impl MetadataFetcher {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Fetches metadata for a track or episode and picks the audio file that
    /// matches `quality`.
    ///
    /// The returned track number is 0; tracks get theirs from
    /// [`fetch_track_detail`](Self::fetch_track_detail).
    pub async fn fetch_leaf(&self, leaf: &ContentRef, quality: Quality) -> Result<LeafMetadata> {
        let gid = utils::base62_to_hex(&leaf.raw_id)
            .ok_or_else(|| Error::InvalidReference(leaf.raw_id.clone()))?;

        match leaf.kind {
            ContentKind::Track => {
                let url = format!(
                    "{base}/metadata/4/track/{gid}?market=from_token",
                    base = self.endpoints.spclient,
                    gid = gid
                );
                let track: TrackMetadataResponse = self.get_json(&url, "track metadata").await?;

                let files = track
                    .file
                    .iter()
                    .chain(track.alternative.iter().flat_map(|alt| alt.file.iter()));
                let file_ref = select_file(files, quality)
                    .ok_or_else(|| Error::FormatUnavailable {
                        id: leaf.raw_id.clone(),
                        quality,
                    })?;

                let artist_name = track
                    .artist
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default();

                Ok(LeafMetadata {
                    kind: ContentKind::Track,
                    display_name: track.name,
                    artist_name,
                    album_name: track.album.name,
                    track_number: 0,
                    internal_file_ref: file_ref,
                    raw_gid: track.gid,
                })
            }
            ContentKind::Episode => {
                let url = format!(
                    "{base}/metadata/4/episode/{gid}?market=from_token",
                    base = self.endpoints.spclient,
                    gid = gid
                );
                let episode: EpisodeMetadataResponse =
                    self.get_json(&url, "episode metadata").await?;

                let file_ref = select_file(episode.audio.iter(), quality).ok_or_else(|| {
                    Error::FormatUnavailable {
                        id: leaf.raw_id.clone(),
                        quality,
                    }
                })?;

                let artist_name = episode
                    .show
                    .publisher
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| episode.show.name.clone());

                Ok(LeafMetadata {
                    kind: ContentKind::Episode,
                    display_name: episode.name,
                    artist_name,
                    album_name: episode.show.name,
                    track_number: 0,
                    internal_file_ref: file_ref,
                    raw_gid: episode.gid,
                })
            }
            other => Err(Error::InvalidReference(format!(
                "{} is a container, not a leaf",
                ContentRef::new(leaf.raw_id.clone(), other)
            ))),
        }
    }

    /// [`fetch_leaf`](Self::fetch_leaf) plus the track number for tracks.
    ///
    /// A failed track number lookup is logged and leaves the number at 0.
    /// Episodes always keep 0.
    pub async fn resolve_leaf(&self, leaf: &ContentRef, quality: Quality) -> Result<LeafMetadata> {
        let mut metadata = self.fetch_leaf(leaf, quality).await?;
        if metadata.kind != ContentKind::Track {
            return Ok(metadata);
        }

        let Some(id) = utils::hex_to_base62(&metadata.raw_gid) else {
            warn!(
                "Cannot derive a track ID from gid {}, using track number 0",
                metadata.raw_gid
            );
            return Ok(metadata);
        };

        match self.fetch_track_detail(&id).await {
            Ok(detail) => metadata.track_number = detail.track_number,
            Err(e) => warn!(
                "Failed to fetch track number for [{}], using 0: {}",
                metadata.display_name, e
            ),
        }
        Ok(metadata)
    }

    /// Fetches the track number from the Web API.
    ///
    /// `id` is the base62 form of the leaf's GID (see [`utils::hex_to_base62`]).
    pub async fn fetch_track_detail(&self, id: &str) -> Result<TrackDetail> {
        let url = format!("{base}/tracks/{id}", base = self.endpoints.web_api, id = id);
        self.get_json(&url, "track data").await
    }

    /// Fetches one listing page of a container.
    pub async fn list_page(
        &self,
        container: &ContentRef,
        offset: usize,
        limit: usize,
    ) -> Result<ListingPage> {
        let base = &self.endpoints.web_api;
        let id = &container.raw_id;

        match container.kind {
            ContentKind::Album => {
                let url = format!("{base}/albums/{id}/tracks?offset={offset}&limit={limit}");
                let page: Paging<IdItem> = self.get_json(&url, "album data").await?;
                Ok(ListingPage {
                    item_count: page.items.len(),
                    has_next: page.next.is_some(),
                    ids: page.items.into_iter().filter_map(|item| item.id).collect(),
                })
            }
            ContentKind::Playlist => {
                let url = format!("{base}/playlists/{id}/tracks?offset={offset}&limit={limit}");
                let page: Paging<PlaylistItem> = self.get_json(&url, "playlist data").await?;
                Ok(ListingPage {
                    item_count: page.items.len(),
                    has_next: page.next.is_some(),
                    ids: page
                        .items
                        .into_iter()
                        .filter_map(|item| item.track.and_then(|t| t.id))
                        .collect(),
                })
            }
            ContentKind::Show => {
                let url = format!("{base}/shows/{id}/episodes?offset={offset}&limit={limit}");
                let page: Paging<Option<IdItem>> = self.get_json(&url, "show data").await?;
                Ok(ListingPage {
                    item_count: page.items.len(),
                    has_next: page.next.is_some(),
                    ids: page
                        .items
                        .into_iter()
                        .filter_map(|item| item.and_then(|i| i.id))
                        .collect(),
                })
            }
            ContentKind::Track | ContentKind::Episode => Err(Error::InvalidReference(format!(
                "{} is a leaf, not a container",
                container
            ))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T> {
        let data = self.transport.request(Method::GET, url, None).await.map_err(|e| {
            debug!("Fetch {} failed: {}", context, e);
            e
        })?;

        serde_json::from_slice(&data).map_err(|e| Error::decode(context, e))
    }
}

fn select_file<'a>(
    mut files: impl Iterator<Item = &'a AudioFile>,
    quality: Quality,
) -> Option<FileId> {
    files
        .find(|f| f.format.eq_ignore_ascii_case(quality.as_str()))
        .and_then(|f| FileId::parse(&f.file_id))
}
