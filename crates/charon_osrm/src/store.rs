use std::io::{BufWriter, Write};
use std::path::PathBuf;

use jiff::Timestamp;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use charon_routing::GeoPoint;

/// One cached provider leg with its expiry deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLeg {
    pub key: String,
    pub expires_at: Timestamp,
    pub points: Vec<GeoPoint>,
}

/// Durable tier of the leg cache. Entries are kept in insertion order;
/// the cache relies on that for first-in-first-out eviction.
pub trait LegStore {
    fn load(&self) -> Result<Vec<StoredLeg>, anyhow::Error>;
    fn save(&self, legs: &[StoredLeg]) -> Result<(), anyhow::Error>;
}

impl<T: LegStore> LegStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Vec<StoredLeg>, anyhow::Error> {
        self.as_ref().load()
    }

    fn save(&self, legs: &[StoredLeg]) -> Result<(), anyhow::Error> {
        self.as_ref().save(legs)
    }
}

/// Single JSON file holding every cached leg.
pub struct FileLegStore {
    path: PathBuf,
}

impl FileLegStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLegStore { path: path.into() }
    }
}

impl LegStore for FileLegStore {
    fn load(&self) -> Result<Vec<StoredLeg>, anyhow::Error> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)?;
        Ok(serde_json::from_reader(file)?)
    }

    fn save(&self, legs: &[StoredLeg]) -> Result<(), anyhow::Error> {
        let file = std::fs::File::create(&self.path)?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);
        serde_json::to_writer(&mut writer, legs)?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory store for tests and cache-less operation.
#[derive(Debug, Default)]
pub struct MemoryLegStore {
    legs: Mutex<Vec<StoredLeg>>,
}

impl LegStore for MemoryLegStore {
    fn load(&self) -> Result<Vec<StoredLeg>, anyhow::Error> {
        Ok(self.legs.lock().clone())
    }

    fn save(&self, legs: &[StoredLeg]) -> Result<(), anyhow::Error> {
        *self.legs.lock() = legs.to_vec();
        Ok(())
    }
}
