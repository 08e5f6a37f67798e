// 🧮 Calculation Handler
// Validates the two form inputs, derives BMI and records the result

use crate::db::MeasurementStore;
use crate::error::{CalculateError, ValidationError};
use chrono::{Local, NaiveDateTime};

/// Storage format for the `date` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// PARSING & VALIDATION
// ============================================================================

/// Parse one text field into a real number.
///
/// Surrounding whitespace is ignored. `nan` and infinities are rejected like
/// any other non-numeric text, since they would slip past the range check.
pub fn parse_measurement(text: &str) -> Result<f64, ValidationError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotNumeric)?;

    if !value.is_finite() {
        return Err(ValidationError::NotNumeric);
    }

    Ok(value)
}

/// Parse both fields, then range-check them.
/// A non-numeric field is reported before a non-positive one.
pub fn validate_inputs(weight_text: &str, height_text: &str) -> Result<(f64, f64), ValidationError> {
    let weight = parse_measurement(weight_text)?;
    let height = parse_measurement(height_text)?;

    if weight <= 0.0 || height <= 0.0 {
        return Err(ValidationError::NotPositive);
    }

    Ok((weight, height))
}

/// Standard metric BMI: kg / m²
///
/// Valid inputs can still overflow (`1e-200` m squares to zero) or
/// underflow to zero; such results are never stored.
pub fn compute_bmi(weight: f64, height: f64) -> Result<f64, ValidationError> {
    let bmi = weight / (height * height);

    if !bmi.is_finite() {
        return Err(ValidationError::NotNumeric);
    }
    if bmi <= 0.0 {
        return Err(ValidationError::NotPositive);
    }

    Ok(bmi)
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BmiReport {
    pub id: i64,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub timestamp: String,
}

impl BmiReport {
    /// BMI rounded to two decimals
    pub fn display_value(&self) -> String {
        format!("{:.2}", self.bmi)
    }

    /// Text for the result dialog
    pub fn message(&self) -> String {
        format!("Your BMI is: {}", self.display_value())
    }
}

// ============================================================================
// HANDLER
// ============================================================================

/// Run one "Calculate BMI" action against the local clock
pub fn calculate<S: MeasurementStore + ?Sized>(
    store: &S,
    weight_text: &str,
    height_text: &str,
) -> Result<BmiReport, CalculateError> {
    calculate_at(store, weight_text, height_text, Local::now().naive_local())
}

/// Same as [`calculate`] with an explicit insert time.
///
/// Nothing is written unless both inputs validate. Every successful call
/// appends a new record, even for identical inputs.
pub fn calculate_at<S: MeasurementStore + ?Sized>(
    store: &S,
    weight_text: &str,
    height_text: &str,
    now: NaiveDateTime,
) -> Result<BmiReport, CalculateError> {
    let (weight, height) = validate_inputs(weight_text, height_text).map_err(|err| {
        tracing::debug!(weight = weight_text, height = height_text, %err, "rejected input");
        err
    })?;

    let bmi = compute_bmi(weight, height).map_err(|err| {
        tracing::debug!(weight, height, %err, "rejected out-of-range result");
        err
    })?;
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

    let id = store.insert(weight, height, bmi, &timestamp).map_err(|err| {
        tracing::error!(%err, "could not store measurement");
        err
    })?;

    Ok(BmiReport {
        id,
        weight,
        height,
        bmi,
        timestamp,
    })
}
