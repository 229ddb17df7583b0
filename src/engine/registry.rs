// Session registry - ordered record of every image compressed since the last clear.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

/// One compressed image: where it lives on disk and what the client called it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRecord {
    pub output_path: PathBuf,
    pub original_filename: String,
}

/// Outcome of looking up a download index.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    Empty,
    Found(CompressionRecord),
    OutOfRange { index: i64, len: usize },
}

/// Process-wide list shared by every request. Cloning shares the same list.
///
/// Individual operations are atomic, but nothing isolates one client from
/// another: a clear from any landing-page load empties the list for everyone.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    records: Arc<RwLock<Vec<CompressionRecord>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: CompressionRecord) {
        let mut records = self.records.write();
        records.push(record);
        debug!("registry now holds {} records", records.len());
    }

    pub fn clear(&self) {
        let mut records = self.records.write();
        if !records.is_empty() {
            debug!("clearing {} records", records.len());
        }
        records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Copy of the records in insertion order.
    pub fn snapshot(&self) -> Vec<CompressionRecord> {
        self.records.read().clone()
    }

    /// Resolve a 1-based download index.
    ///
    /// Position `index - 1` is used, so `index == 0` wraps around to the
    /// last record. Callers reject negative indices before getting here.
    pub fn resolve(&self, index: i64) -> Lookup {
        let records = self.records.read();
        let len = records.len();
        if len == 0 {
            return Lookup::Empty;
        }

        let position = if index == 0 {
            Some(len - 1)
        } else {
            usize::try_from(index - 1).ok().filter(|p| *p < len)
        };

        match position {
            Some(p) => Lookup::Found(records[p].clone()),
            None => Lookup::OutOfRange { index, len },
        }
    }
}
