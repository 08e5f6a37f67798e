use std::path::PathBuf;

/// Database file, relative to the working directory
pub const DEFAULT_DB_FILE: &str = "bmi_data.db";

/// Fixed application settings. Nothing is read from flags or the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub window_title: String,
    pub chart_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            window_title: "BMI Calculator".to_string(),
            chart_title: "BMI Trend Over Time".to_string(),
        }
    }
}
