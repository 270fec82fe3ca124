//! Persistent store of per-frame summaries
//!
//! A SQLite database with one `ndvi_results` table. Each save is one
//! transaction; ids come from `AUTOINCREMENT`, so they stay unique across
//! processes and are never reused.

use crate::error::Result;
use crate::records::{nan_as_null, FrameSummary};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Default store location, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = "cropwatch.db";

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS ndvi_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    mean_ndvi REAL,
    std_ndvi REAL,
    anomaly_pixels INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// A summary row as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSummary {
    /// 1-based, increasing across saves
    pub id: i64,
    pub label: String,
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    #[serde(with = "nan_as_null")]
    pub std: f64,
    pub anomaly_pixels: usize,
    pub created_at: DateTime<Utc>,
}

/// Append-only result store backed by a SQLite file
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Open the store at `path`, creating the database, its table and the
    /// parent directory if absent
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let store = Self { path };
        store.connect()?;
        Ok(store)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// Insert one row per summary and return the stored rows.
    ///
    /// All rows of one call share a timestamp and are committed together;
    /// on error nothing is written.
    pub fn save(&self, summaries: &[FrameSummary]) -> Result<Vec<StoredSummary>> {
        let mut conn = self.connect()?;
        let created_at = Utc::now();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut rows = Vec::with_capacity(summaries.len());
        {
            let mut insert = tx.prepare(
                "INSERT INTO ndvi_results (date, mean_ndvi, std_ndvi, anomaly_pixels, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for s in summaries {
                insert.execute(params![
                    s.label,
                    not_nan(s.mean),
                    not_nan(s.std),
                    s.anomaly_pixels as i64,
                    created_at
                ])?;
                rows.push(StoredSummary {
                    id: tx.last_insert_rowid(),
                    label: s.label.clone(),
                    mean: s.mean,
                    std: s.std,
                    anomaly_pixels: s.anomaly_pixels,
                    created_at,
                });
            }
        }
        tx.commit()?;

        info!("Saved {} summary rows to {}", rows.len(), self.path.display());
        Ok(rows)
    }

    /// Every stored row, in id order
    pub fn fetch_all(&self) -> Result<Vec<StoredSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, date, mean_ndvi, std_ndvi, anomaly_pixels, created_at
             FROM ndvi_results ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StoredSummary {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    mean: row.get::<_, Option<f64>>(2)?.unwrap_or(f64::NAN),
                    std: row.get::<_, Option<f64>>(3)?.unwrap_or(f64::NAN),
                    anomaly_pixels: row
                        .get::<_, Option<i64>>(4)?
                        .map_or(0, |n| n.max(0) as usize),
                    created_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

/// Missing statistics are stored as NULL
fn not_nan(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}
