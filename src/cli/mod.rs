//! # CLI Module
//!
//! This module provides the command-line interface layer for spdl. It
//! implements the user-facing commands and wires the configuration, the
//! Spotify integration layer and terminal output together.
//!
//! ## Commands
//!
//! - [`plan`] - Dry run: resolves a reference into the files a download would
//!   produce and prints them as a table
//!
//! Downloading itself is a library operation
//! ([`Downloader`](crate::management::Downloader)) because it needs DRM
//! capabilities that the host application has to provide.
//!
//! ## Architecture Design
//!
//! ```text
//! CLI Layer (User Interface)
//!     ↓
//! Spotify Integration Layer (metadata, expansion)
//!     ↓
//! Transport (HTTP Requests)
//! ```
//!
//! ## Error Handling
//!
//! Configuration and classification failures terminate with the red `error!`
//! macro. Per-leaf failures while planning a container are shown as warnings
//! and the remaining leaves are still listed.
//!
//! ## Progress and User Experience
//!
//! Long-running lookups show an `indicatif` spinner. Results are rendered with
//! `tabled`.
//!
//! ## Usage Patterns
//!
//! ```bash
//! spdl plan https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC
//! spdl plan spotify:playlist:37i9dQZF1DXcBWIGoYBM5M
//! spdl completions zsh
//! ```

mod plan;

pub use plan::plan;
