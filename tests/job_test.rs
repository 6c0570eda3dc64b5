use std::path::Path;

use spdl::{
    management::{DownloadJob, LeafState, TempArtifact},
    types::{ContainerFormat, ContentKind, ContentRef, FileId, LeafMetadata},
};
use tempfile::TempDir;

fn metadata(track_number: u32) -> LeafMetadata {
    LeafMetadata {
        kind: ContentKind::Track,
        display_name: "What's Up?".to_string(),
        artist_name: "4 Non Blondes".to_string(),
        album_name: "Bigger/Better".to_string(),
        track_number,
        internal_file_ref: FileId::parse("0000000000000000000000000000000000000001").unwrap(),
        raw_gid: "00000000000000000000000000000001".to_string(),
    }
}

fn planned(track_number: u32) -> DownloadJob {
    DownloadJob::plan(
        ContentRef::new("0000000000000000000001", ContentKind::Track),
        metadata(track_number),
        ContainerFormat::Mp4,
        Path::new("/music"),
    )
}

#[test]
fn test_plan_builds_deterministic_final_path() {
    let job = planned(3);

    assert_eq!(
        job.final_path,
        Path::new("/music/4 Non Blondes/Bigger-Better/03. What's Up_.m4a")
    );
    assert_eq!(job.directory, Path::new("/music/4 Non Blondes/Bigger-Better"));
    assert_eq!(job.state, LeafState::FormatSelected);
    assert_eq!(planned(12).final_path.file_name().unwrap(), "12. What's Up_.m4a");
}

#[test]
fn test_plan_scratch_paths_are_unique() {
    let first = planned(3);
    let second = planned(3);

    assert_eq!(first.final_path, second.final_path);
    assert_ne!(first.temp_path, second.temp_path);
    assert_ne!(first.part_path, second.part_path);

    for path in [&first.temp_path, &first.part_path] {
        assert_eq!(path.parent(), Some(first.directory.as_path()));
        assert_ne!(path, &first.final_path);
    }
    let temp_name = first.temp_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(temp_name.starts_with("03. What's Up_.m4a."));
    assert!(temp_name.ends_with(".tmp"));
    assert!(first.part_path.to_string_lossy().ends_with(".part"));
}

#[test]
fn test_leaf_state_sequence() {
    let mut job = planned(1);
    let mut seen = vec![job.state];
    while !job.state.is_terminal() {
        job.advance();
        seen.push(job.state);
    }

    assert_eq!(
        seen,
        vec![
            LeafState::FormatSelected,
            LeafState::KeyAcquired,
            LeafState::Streamed,
            LeafState::Decrypted,
            LeafState::PostProcessed,
            LeafState::Done,
        ]
    );

    // Done is final
    job.abort();
    assert_eq!(job.state, LeafState::Done);
}

#[test]
fn test_abort_from_any_active_state() {
    let mut job = planned(1);
    job.advance();
    job.abort();

    assert_eq!(job.state, LeafState::Aborted);
    assert_eq!(job.state.next(), None);
}

#[test]
fn test_temp_artifact_removed_on_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scratch.tmp");
    std::fs::write(&path, b"encrypted").unwrap();

    {
        let artifact = TempArtifact::new(&path);
        assert_eq!(artifact.path(), path);
    }

    assert!(!path.exists());

    // A file that never got created is fine too
    drop(TempArtifact::new(dir.path().join("never.tmp")));
}

#[tokio::test]
async fn test_temp_artifact_persist_renames() {
    let dir = TempDir::new().unwrap();
    let part = dir.path().join("song.m4a.part");
    let done = dir.path().join("song.m4a");
    std::fs::write(&part, b"decrypted").unwrap();

    TempArtifact::new(&part).persist(&done).await.unwrap();

    assert!(!part.exists());
    assert_eq!(std::fs::read(&done).unwrap(), b"decrypted".to_vec());
}
