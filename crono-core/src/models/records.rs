//! Typed export records.
//!
//! Three record shapes come out of the export endpoint, one per
//! [`ExportKind`](super::ExportKind):
//! - [`NutritionRecord`] - one row per day with macro totals plus every other column
//! - [`ExerciseRecord`] - one row per logged exercise
//! - [`BiometricRecord`] - one row per reading
//!
//! Every record carries its source date in canonical `YYYY-MM-DD` form.
//! Serialized field names are part of the output contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::export::ExportKind;

// ============================================================================
// Field Value
// ============================================================================

/// A cell value that is numeric when the source text allows it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value.
    Number(f64),
    /// Verbatim text.
    Text(String),
}

impl FieldValue {
    /// Coerces a cell: a number when the trimmed text parses cleanly as a
    /// finite float, the trimmed text otherwise.
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Coerces a measurement: a number only for plain decimals
    /// (`-?digits(.digits)?`), so readings like `120/80` stay text.
    pub fn from_amount(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_plain_decimal(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return Self::Number(n);
            }
        }
        Self::Text(trimmed.to_string())
    }

    /// Returns the numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns the text value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serialize_number(n, serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Largest magnitude an `f64` holds with every integer exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes whole numbers without a fractional part (`1847`, not `1847.0`).
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_possible_truncation)]
fn serialize_number<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*n as i64)
    } else {
        serializer.serialize_f64(*n)
    }
}

fn is_plain_decimal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.is_none_or(digits)
}

// ============================================================================
// Records
// ============================================================================

/// Daily nutrition summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    /// Day in `YYYY-MM-DD` form.
    pub date: String,
    /// Energy in kcal.
    #[serde(serialize_with = "serialize_number")]
    pub calories: f64,
    /// Protein in grams.
    #[serde(serialize_with = "serialize_number")]
    pub protein: f64,
    /// Carbohydrates in grams.
    #[serde(serialize_with = "serialize_number")]
    pub carbs: f64,
    /// Fat in grams.
    #[serde(serialize_with = "serialize_number")]
    pub fat: f64,
    /// Every other populated column, keyed by its header.
    #[serde(flatten)]
    pub extra: BTreeMap<String, FieldValue>,
}

/// A logged exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    /// Day in `YYYY-MM-DD` form.
    pub date: String,
    /// Time of day as exported (e.g. `07:30 AM`).
    pub time: String,
    /// Exercise name.
    pub exercise: String,
    /// Duration in minutes.
    #[serde(serialize_with = "serialize_number")]
    pub minutes: f64,
    /// Energy burned in kcal.
    #[serde(serialize_with = "serialize_number")]
    pub calories_burned: f64,
    /// Category label (e.g. `Cardiovascular`).
    pub group: String,
}

/// A biometric reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricRecord {
    /// Day in `YYYY-MM-DD` form.
    pub date: String,
    /// Time of day as exported.
    pub time: String,
    /// Metric name (e.g. `Weight`).
    pub metric: String,
    /// Unit label (e.g. `lbs`).
    pub unit: String,
    /// Reading; composite values such as `120/80` stay text.
    pub amount: FieldValue,
}

// ============================================================================
// Export Records
// ============================================================================

/// Records parsed from one export, tagged by kind.
///
/// Serializes as a plain array of record mappings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportRecords {
    /// Nutrition export.
    Nutrition(Vec<NutritionRecord>),
    /// Exercise export.
    Exercises(Vec<ExerciseRecord>),
    /// Biometric export.
    Biometrics(Vec<BiometricRecord>),
}

impl ExportRecords {
    /// The export kind these records came from.
    pub fn kind(&self) -> ExportKind {
        match self {
            Self::Nutrition(_) => ExportKind::Nutrition,
            Self::Exercises(_) => ExportKind::Exercises,
            Self::Biometrics(_) => ExportKind::Biometrics,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            Self::Nutrition(r) => r.len(),
            Self::Exercises(r) => r.len(),
            Self::Biometrics(r) => r.len(),
        }
    }

    /// Returns true if no records were parsed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source dates of all records, in export order.
    pub fn dates(&self) -> Vec<&str> {
        match self {
            Self::Nutrition(r) => r.iter().map(|e| e.date.as_str()).collect(),
            Self::Exercises(r) => r.iter().map(|e| e.date.as_str()).collect(),
            Self::Biometrics(r) => r.iter().map(|e| e.date.as_str()).collect(),
        }
    }
}
