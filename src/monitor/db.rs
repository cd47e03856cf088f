//! SQLite snapshot sink
//!
//! The core is fully in-memory; this sink is the runtime's durable record
//! of what the monitor saw and decided. Inventory snapshots are
//! append-only; alert events are upserted by id so resolution updates the
//! stored row.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::error::MonitorError;
use super::types::{Alert, CategoryId, StockStatus};

/// Point-in-time record of one category's state, written on each flush.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub category_id: CategoryId,
    pub count: u32,
    pub confidence: f64,
    pub status: StockStatus,
    pub observed_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

/// Destination for periodic snapshot and alert-event flushes.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Append inventory snapshots, one per category.
    async fn write_snapshots(&self, snapshots: Vec<InventorySnapshot>) -> Result<(), MonitorError>;

    /// Upsert alert records by id. Covers both creation and resolution:
    /// a resolved alert overwrites its active row.
    async fn write_alerts(&self, alerts: Vec<Alert>) -> Result<(), MonitorError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL,
    count INTEGER NOT NULL,
    confidence REAL NOT NULL,
    status TEXT NOT NULL,
    observed_at INTEGER NOT NULL,
    recorded_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snapshots_category_time
    ON inventory_snapshots (category_id, recorded_at);

CREATE TABLE IF NOT EXISTS alert_events (
    id INTEGER PRIMARY KEY,
    category_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    count INTEGER NOT NULL,
    is_active INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    resolved_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_alert_events_active
    ON alert_events (is_active, created_at);
"#;

/// SQLite implementation of [`SnapshotSink`].
pub struct SqliteSnapshotSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotSink {
    /// Open (or create) the database, enable WAL, and apply the idempotent
    /// schema.
    pub fn open(db_path: &str) -> Result<Self, MonitorError> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl SnapshotSink for SqliteSnapshotSink {
    async fn write_snapshots(&self, snapshots: Vec<InventorySnapshot>) -> Result<(), MonitorError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for snap in snapshots {
            tx.execute(
                "INSERT INTO inventory_snapshots
                    (category_id, count, confidence, status, observed_at, recorded_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    snap.category_id,
                    snap.count,
                    snap.confidence,
                    snap.status.as_str(),
                    snap.observed_at.timestamp(),
                    snap.recorded_at.timestamp(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn write_alerts(&self, alerts: Vec<Alert>) -> Result<(), MonitorError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for alert in alerts {
            tx.execute(
                "INSERT INTO alert_events
                    (id, category_id, kind, message, count, is_active, created_at, resolved_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    message = excluded.message,
                    is_active = excluded.is_active,
                    resolved_at = excluded.resolved_at",
                rusqlite::params![
                    alert.id as i64,
                    alert.category_id,
                    alert.kind.as_str(),
                    alert.message,
                    alert.count_at_creation,
                    alert.is_active as i64,
                    alert.created_at.timestamp(),
                    alert.resolved_at.map(|t| t.timestamp()),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::AlertKind;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn make_sink() -> (NamedTempFile, SqliteSnapshotSink) {
        let temp = NamedTempFile::new().unwrap();
        let sink = SqliteSnapshotSink::open(temp.path().to_str().unwrap()).unwrap();
        (temp, sink)
    }

    fn make_alert(id: u64, active: bool) -> Alert {
        Alert {
            id,
            category_id: 1,
            kind: AlertKind::LowStock,
            message: "Dairy is running low (7 remaining)".to_string(),
            count_at_creation: 7,
            is_active: active,
            created_at: ts(0),
            resolved_at: if active { None } else { Some(ts(60)) },
        }
    }

    #[tokio::test]
    async fn test_snapshots_append() {
        let (temp, sink) = make_sink();

        let snap = InventorySnapshot {
            category_id: 1,
            count: 12,
            confidence: 0.88,
            status: StockStatus::Normal,
            observed_at: ts(0),
            recorded_at: ts(5),
        };
        sink.write_snapshots(vec![snap.clone()]).await.unwrap();
        sink.write_snapshots(vec![snap]).await.unwrap();

        let conn = Connection::open(temp.path()).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM inventory_snapshots", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_alert_upsert_marks_resolution() {
        let (temp, sink) = make_sink();

        sink.write_alerts(vec![make_alert(1, true)]).await.unwrap();
        sink.write_alerts(vec![make_alert(1, false)]).await.unwrap();

        let conn = Connection::open(temp.path()).unwrap();
        let (rows, active, resolved_at): (i64, i64, Option<i64>) = conn
            .query_row(
                "SELECT COUNT(*), MAX(is_active), MAX(resolved_at) FROM alert_events",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(active, 0);
        assert_eq!(resolved_at, Some(ts(60).timestamp()));
    }

    #[tokio::test]
    async fn test_schema_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap();
        let _first = SqliteSnapshotSink::open(path).unwrap();
        let _second = SqliteSnapshotSink::open(path).unwrap();
    }
}
