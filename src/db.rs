use crate::error::StoreError;
use rusqlite::{params, Connection};
use std::cell::{Cell, RefCell};
use std::path::Path;

/// One persisted BMI computation
/// Rows are append-only: there is no update or delete path
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Assigned by the store (AUTOINCREMENT)
    pub id: i64,
    /// Local wall clock at insert time, `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
}

/// Storage seam used by the calculator, the history viewer and the UI.
pub trait MeasurementStore {
    /// Create the measurement table if absent. Never drops or alters data.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Append one record and return its id
    fn insert(&self, weight: f64, height: f64, bmi: f64, timestamp: &str) -> Result<i64, StoreError>;

    /// `(date, bmi)` pairs in creation order. Empty when nothing is stored.
    fn fetch_all(&self) -> Result<Vec<(String, f64)>, StoreError>;

    /// Full rows in creation order
    fn fetch_measurements(&self) -> Result<Vec<Measurement>, StoreError>;

    fn count(&self) -> Result<i64, StoreError>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;

        // Touch the file header so an unreadable file fails here, not on first use
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|source| StoreError::Open {
                path: path.display().to_string(),
                source,
            })?;

        tracing::info!(path = %path.display(), "opened measurement store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;

        Ok(Self { conn })
    }
}

impl MeasurementStore for SqliteStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS bmi_data (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT,
                    weight REAL,
                    height REAL,
                    bmi REAL
                )",
                [],
            )
            .map_err(StoreError::Schema)?;

        tracing::debug!("bmi_data table ready");
        Ok(())
    }

    fn insert(&self, weight: f64, height: f64, bmi: f64, timestamp: &str) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO bmi_data (date, weight, height, bmi) VALUES (?1, ?2, ?3, ?4)",
                params![timestamp, weight, height, bmi],
            )
            .map_err(StoreError::Write)?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, bmi, "stored measurement");
        Ok(id)
    }

    fn fetch_all(&self) -> Result<Vec<(String, f64)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, bmi FROM bmi_data ORDER BY id")
            .map_err(StoreError::Read)?;

        let rows: Vec<(String, f64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(StoreError::Read)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Read)?;

        tracing::debug!(count = rows.len(), "fetched history");
        Ok(rows)
    }

    fn fetch_measurements(&self) -> Result<Vec<Measurement>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, date, weight, height, bmi FROM bmi_data ORDER BY id")
            .map_err(StoreError::Read)?;

        let measurements = stmt
            .query_map([], |row| {
                Ok(Measurement {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    weight: row.get(2)?,
                    height: row.get(3)?,
                    bmi: row.get(4)?,
                })
            })
            .map_err(StoreError::Read)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Read)?;

        Ok(measurements)
    }

    fn count(&self) -> Result<i64, StoreError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM bmi_data", [], |row| row.get(0))
            .map_err(StoreError::Read)
    }
}

// ============================================================================
// STARTUP
// ============================================================================

/// Open the database file and make sure the table exists.
///
/// Always returns a usable store: when the file cannot be opened the
/// returned store answers every call with `StoreError::Unavailable`.
/// The startup error, if any, is handed back for the UI to display.
pub fn open_store(path: &Path) -> (Box<dyn MeasurementStore>, Option<StoreError>) {
    let store = match SqliteStore::open(path) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(%err, "could not open measurement store");
            let fallback = UnavailableStore::new(err.to_string());
            return (Box::new(fallback), Some(err));
        }
    };

    match store.ensure_schema() {
        Ok(()) => (Box::new(store), None),
        Err(err) => {
            tracing::error!(%err, "could not prepare bmi_data table");
            (Box::new(store), Some(err))
        }
    }
}

impl<T: MeasurementStore + ?Sized> MeasurementStore for Box<T> {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        (**self).ensure_schema()
    }

    fn insert(&self, weight: f64, height: f64, bmi: f64, timestamp: &str) -> Result<i64, StoreError> {
        (**self).insert(weight, height, bmi, timestamp)
    }

    fn fetch_all(&self) -> Result<Vec<(String, f64)>, StoreError> {
        (**self).fetch_all()
    }

    fn fetch_measurements(&self) -> Result<Vec<Measurement>, StoreError> {
        (**self).fetch_measurements()
    }

    fn count(&self) -> Result<i64, StoreError> {
        (**self).count()
    }
}

/// Stand-in for a database that could not be opened
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }

    fn error(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl MeasurementStore for UnavailableStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        Err(self.error())
    }

    fn insert(&self, _weight: f64, _height: f64, _bmi: f64, _timestamp: &str) -> Result<i64, StoreError> {
        Err(self.error())
    }

    fn fetch_all(&self) -> Result<Vec<(String, f64)>, StoreError> {
        Err(self.error())
    }

    fn fetch_measurements(&self) -> Result<Vec<Measurement>, StoreError> {
        Err(self.error())
    }

    fn count(&self) -> Result<i64, StoreError> {
        Err(self.error())
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Vec-backed store for tests and for running the UI without a database file
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RefCell<Vec<Measurement>>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `insert` fail with `StoreError::ReadOnly`
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }
}

impl MeasurementStore for MemoryStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert(&self, weight: f64, height: f64, bmi: f64, timestamp: &str) -> Result<i64, StoreError> {
        if self.read_only.get() {
            return Err(StoreError::ReadOnly);
        }

        let mut rows = self.rows.borrow_mut();
        let id = rows.last().map_or(1, |m| m.id + 1);
        rows.push(Measurement {
            id,
            date: timestamp.to_string(),
            weight,
            height,
            bmi,
        });

        Ok(id)
    }

    fn fetch_all(&self) -> Result<Vec<(String, f64)>, StoreError> {
        Ok(self
            .rows
            .borrow()
            .iter()
            .map(|m| (m.date.clone(), m.bmi))
            .collect())
    }

    fn fetch_measurements(&self) -> Result<Vec<Measurement>, StoreError> {
        Ok(self.rows.borrow().clone())
    }

    fn count(&self) -> Result<i64, StoreError> {
        Ok(self.rows.borrow().len() as i64)
    }
}
