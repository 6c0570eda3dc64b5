mod downloader;
mod job;
mod report;

pub use downloader::Downloader;
pub use job::DownloadJob;
pub use job::LeafState;
pub use job::TempArtifact;
pub use report::BatchReport;
