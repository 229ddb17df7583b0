// Compression statistics - per-image size arithmetic and process-wide totals.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CompressError;

/// Sizes measured for one compressed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub input_size: u64,
    pub output_size: u64,
}

impl CompressionStats {
    /// Fails for an empty input, where the percentage has no defined value.
    pub fn new(input_size: u64, output_size: u64) -> Result<Self, CompressError> {
        if input_size == 0 {
            return Err(CompressError::EmptyUpload);
        }
        Ok(Self {
            input_size,
            output_size,
        })
    }

    /// `(1 - output/input) * 100`. Negative when the output grew.
    pub fn percentage(&self) -> f64 {
        (1.0 - self.output_size as f64 / self.input_size as f64) * 100.0
    }

    pub fn formatted_percentage(&self) -> String {
        format!("{:.2}%", self.percentage())
    }

    pub fn formatted_output_size(&self) -> String {
        format!("{} bytes", self.output_size)
    }
}

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub images_compressed: u64,
    pub failures: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl StatsSnapshot {
    /// Bytes saved across every successful compression; negative if outputs grew overall.
    pub fn bytes_saved(&self) -> i64 {
        self.input_bytes as i64 - self.output_bytes as i64
    }
}

pub struct StatsCollector {
    images_compressed: AtomicU64,
    failures: AtomicU64,
    input_bytes_total: AtomicU64,
    output_bytes_total: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            images_compressed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            input_bytes_total: AtomicU64::new(0),
            output_bytes_total: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self, stats: &CompressionStats) {
        self.images_compressed.fetch_add(1, Ordering::Relaxed);
        self.input_bytes_total
            .fetch_add(stats.input_size, Ordering::Relaxed);
        self.output_bytes_total
            .fetch_add(stats.output_size, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            images_compressed: self.images_compressed.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            input_bytes: self.input_bytes_total.load(Ordering::Relaxed),
            output_bytes: self.output_bytes_total.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
