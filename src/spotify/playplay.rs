//! PlayPlay license wire messages.
//!
//! Hand-maintained prost definitions equivalent to:
//!
//! ```text
//! message PlayPlayLicenseRequest {
//!   optional int32 version = 1;
//!   optional bytes token = 2;
//!   optional bytes cache_id = 3;
//!   optional Interactivity interactivity = 4;
//!   optional ContentType content_type = 5;
//!   optional int64 timestamp = 6;
//! }
//! message PlayPlayLicenseResponse {
//!   optional bytes obfuscated_key = 1;
//! }
//! ```

/// Protocol version declared in every request.
pub const PLAYPLAY_VERSION: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Interactivity {
    UnknownInteractivity = 0,
    Interactive = 1,
    Download = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ContentType {
    UnknownContentType = 0,
    AudioTrack = 1,
    AudioEpisode = 2,
    AudioAdd = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayPlayLicenseRequest {
    #[prost(int32, optional, tag = "1")]
    pub version: ::core::option::Option<i32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub token: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub cache_id: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(enumeration = "Interactivity", optional, tag = "4")]
    pub interactivity: ::core::option::Option<i32>,
    #[prost(enumeration = "ContentType", optional, tag = "5")]
    pub content_type: ::core::option::Option<i32>,
    #[prost(int64, optional, tag = "6")]
    pub timestamp: ::core::option::Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlayPlayLicenseResponse {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub obfuscated_key: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

impl PlayPlayLicenseRequest {
    /// Request for interactive playback of an audio track.
    pub fn interactive_track(token: Vec<u8>) -> Self {
        Self {
            version: Some(PLAYPLAY_VERSION),
            token: Some(token),
            interactivity: Some(Interactivity::Interactive as i32),
            content_type: Some(ContentType::AudioTrack as i32),
            ..Default::default()
        }
    }
}
