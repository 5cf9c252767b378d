#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// 2024-01-01T00:00:00Z in microseconds
pub const BASE_US: i64 = 1_704_067_200_000_000;
pub const MINUTE_US: i64 = 60_000_000;

#[derive(Debug, Clone)]
pub struct Kline {
    pub minute: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl Kline {
    pub fn new(minute: i64, close: f64, volume: f64) -> Self {
        Self {
            minute,
            open: close.to_string(),
            high: (close + 1.0).to_string(),
            low: (close - 1.0).to_string(),
            close: close.to_string(),
            volume: volume.to_string(),
        }
    }

    pub fn line(&self) -> String {
        let open_time = BASE_US + self.minute * MINUTE_US;
        format!(
            "{},{},{},{},{},{},{},1000.0,17,5.0,500.0,0",
            open_time,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            open_time + MINUTE_US - 1
        )
    }
}

/// Write a zip archive holding a single headerless kline CSV.
pub fn write_archive(dir: &Path, name: &str, klines: &[Kline]) -> PathBuf {
    let body: Vec<String> = klines.iter().map(Kline::line).collect();
    write_raw_archive(dir, name, &format!("{}.csv", name.trim_end_matches(".zip")), &body.join("\n"))
}

pub fn write_raw_archive(dir: &Path, name: &str, member: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut zip = zip::ZipWriter::new(File::create(&path).expect("create archive"));
    zip.start_file(member, SimpleFileOptions::default())
        .expect("start member");
    zip.write_all(content.as_bytes()).expect("write member");
    zip.finish().expect("finish archive");
    path
}

/// `count` consecutive minutes with a gently varying close and volume.
pub fn month_of_klines(start_minute: i64, count: usize) -> Vec<Kline> {
    (0..count)
        .map(|i| {
            let close = 100.0 + (i % 11) as f64 * 0.5;
            let volume = 10.0 + (i % 7) as f64;
            Kline::new(start_minute + i as i64, close, volume)
        })
        .collect()
}
