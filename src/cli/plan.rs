use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::Config,
    error, info,
    spotify::{self, ContainerExpander, HttpTransport, MetadataFetcher, Transport},
    success,
    types::{ContentKind, ContentRef, PlanTableRow},
    utils, warning,
};

/// Shows what a download of `reference` would produce, without downloading.
///
/// Classifies the reference, expands containers into their tracks or
/// episodes and fetches metadata for every leaf. The result is printed as a
/// table of track number, title, artist, album and the output path each leaf
/// would be written to. No license server is contacted and nothing is
/// written to disk, so no DRM capabilities are needed.
///
/// # Arguments
///
/// * `reference` - An `open.spotify.com` URL, a `spotify:` URI or a bare track ID
///
/// # Error Handling
///
/// - **Configuration or classification errors**: Terminate with error message
/// - **Expansion failures**: Terminate with error message
/// - **Per-leaf metadata failures**: Reported as warnings, the leaf is skipped
///
/// # Example Usage
///
/// ```bash
/// spdl plan https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy
/// spdl plan spotify:show:5CfCWKI5pZ28U0uOzXkDHe
/// ```
pub async fn plan(reference: String) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };

    let content = match spotify::classify(&reference) {
        Ok(content) => content,
        Err(e) => error!("{}", e),
    };

    let transport: Arc<dyn Transport> = match HttpTransport::new(&config) {
        Ok(transport) => Arc::new(transport),
        Err(e) => error!("Cannot create HTTP client. Err: {}", e),
    };
    let metadata = MetadataFetcher::new(transport, config.endpoints.clone());

    info!(
        "Resolving {} at {} into {}",
        content,
        config.quality,
        config.output_root.display()
    );

    let pb = ProgressBar::new_spinner();
    if content.kind.is_container() {
        pb.set_message(format!("Expanding {}...", content.kind));
    } else {
        pb.set_message("Fetching metadata...");
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let leaves: Vec<ContentRef> = if content.kind.is_container() {
        let expander = ContainerExpander::new(metadata.clone());
        match expander.expand(&content).await {
            Ok(ids) => ids
                .into_iter()
                .map(|id| ContentRef::new(id, content.kind.leaf_kind()))
                .collect(),
            Err(e) => {
                pb.finish_and_clear();
                error!("Cannot expand {}. Err: {}", content, e);
            }
        }
    } else {
        vec![content.clone()]
    };

    let total = leaves.len();
    let mut rows: Vec<PlanTableRow> = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (index, leaf) in leaves.iter().enumerate() {
        pb.set_message(format!("Fetching metadata ({}/{})...", index + 1, total));

        match metadata.resolve_leaf(leaf, config.quality).await {
            Ok(meta) => {
                let directory =
                    utils::output_directory(&config.output_root, &meta.artist_name, &meta.album_name);
                let file_name = format!(
                    "{}.{}",
                    utils::output_file_stem(meta.track_number, &meta.display_name),
                    config.quality.format().extension()
                );

                rows.push(PlanTableRow {
                    number: match meta.kind {
                        ContentKind::Track => utils::pad_track_number(meta.track_number),
                        _ => "-".to_string(),
                    },
                    title: meta.display_name,
                    artist: meta.artist_name,
                    album: meta.album_name,
                    path: directory.join(file_name).display().to_string(),
                });
            }
            Err(e) => skipped.push((leaf.raw_id.clone(), e)),
        }
    }

    pb.finish_and_clear();

    for (id, e) in &skipped {
        warning!("Skipping [{}]: {}", id, e);
    }

    if rows.is_empty() {
        warning!("Nothing to download for {}", content);
        return;
    }

    let planned = rows.len();
    let table = Table::new(rows);
    println!("{}", table);
    success!(
        "Planned {} of {} file(s) at {}",
        planned,
        total,
        config.quality
    );
}
