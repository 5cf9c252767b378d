pub mod archive_reader;
pub mod merger;

pub use archive_reader::{ArchiveReader, read_archive};
pub use merger::{DuplicatePolicy, Merger, merge};
