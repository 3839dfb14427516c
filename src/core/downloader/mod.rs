mod cache;
mod client;
mod retry;

pub use cache::{is_sha1_hex, path_exists, sha1_file, ObjectStore};
pub use client::{DownloadEntry, Downloader, FetchOutcome};
pub use retry::{retry_with, FETCH_ATTEMPTS};
