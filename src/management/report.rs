use std::path::PathBuf;

use crate::error::Error;

/// Outcome of a download request, in listing order.
///
/// A single-leaf request that succeeds yields a report with one success.
/// Container requests collect per-leaf failures here instead of aborting.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(String, PathBuf)>,
    /// Each entry is an [`Error::Leaf`].
    pub failed: Vec<Error>,
}

impl BatchReport {
    pub fn record(&mut self, id: String, outcome: Result<PathBuf, Error>) {
        match outcome {
            Ok(path) => self.succeeded.push((id, path)),
            Err(e) => self.failed.push(e),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.succeeded.iter().map(|(_, path)| path)
    }

    /// IDs of failed leaves, taken from their [`Error::Leaf`] wrappers.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter_map(|e| match e {
                Error::Leaf { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}
