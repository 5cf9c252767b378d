pub mod vision;

pub use vision::{BinanceVisionFetcher, archive_file_name, archive_url};
