// BMI Tracker - Core Library
// Store, calculator and history series shared by the TUI binary and tests

pub mod calculator;
pub mod config;
pub mod db;
pub mod error;
pub mod history;

// Re-export commonly used types
pub use calculator::{
    calculate, calculate_at, compute_bmi, parse_measurement, validate_inputs,
    BmiReport, TIMESTAMP_FORMAT,
};
pub use config::AppConfig;
pub use db::{open_store, Measurement, MeasurementStore, MemoryStore, SqliteStore, UnavailableStore};
pub use error::{CalculateError, StoreError, ValidationError};
pub use history::{view_history, HistorySeries, HistoryView, EMPTY_HISTORY_MESSAGE};
