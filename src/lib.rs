//! Spotify Content Download Library
//!
//! This library resolves Spotify references (tracks, episodes, albums,
//! playlists and shows) into decrypted audio files on disk. It expands
//! containers into their tracks or episodes, fetches per-leaf metadata,
//! acquires content keys through the Widevine (MP4) or PlayPlay (OGG) license
//! exchange, streams the encrypted payload and decrypts it in place.
//!
//! The DRM primitives themselves (the CDM, the PlayPlay deobfuscation and the
//! container decryptors) are not part of this crate. They are supplied by the
//! host application through the capability traits re-exported below.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `decrypt` - Decryption capabilities and their dispatcher
//! - `error` - Error taxonomy of the pipeline
//! - `management` - The per-leaf download pipeline and batch driver
//! - `postprocess` - Optional MP3 conversion and metadata tagging
//! - `spotify` - Spotify metadata, license and storage clients
//! - `types` - Data structures and type definitions
//! - `utils` - ID conversion and output path helpers
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use spdl::{config::Config, management::Downloader, spotify::HttpTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> spdl::Res<()> {
//!     spdl::config::load_env().await?;
//!     let config = Config::from_env()?;
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!     let downloader = Downloader::new(config, transport, cdm, deobfuscator, mp4, ogg);
//!     let report = downloader
//!         .download("https://open.spotify.com/album/...", &CancellationToken::new())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod decrypt;
pub mod error;
pub mod management;
pub mod postprocess;
pub mod spotify;
pub mod types;
pub mod utils;

pub use decrypt::{Mp4Decryptor, OggStreamDecryptor};
pub use error::{Error, KeyStep};
pub use postprocess::{MetadataTagger, Transcoder};
pub use spotify::{ContentDecryptionModule, PlayPlayDeobfuscator, Transport};

/// Boxed error returned by host-provided capabilities.
pub type CapabilityError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result type alias for operations that may fail.
///
/// Provides a standard error handling pattern for capability implementations
/// and the binary, using a boxed dynamic error trait object. Pipeline
/// operations return the typed [`error::Result`] instead.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
pub type Res<T> = std::result::Result<T, CapabilityError>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates in the command-line interface.
///
/// # Example
///
/// ```ignore
/// info!("Resolving {}", reference);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```ignore
/// success!("Planned {} file(s)", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Used for unrecoverable errors
/// that require immediate program termination.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors where
/// recovery is not possible.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, such as a leaf whose metadata could not be
/// fetched while planning a container.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
