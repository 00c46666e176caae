//! CSV parsing for Cronometer exports.
//!
//! The export endpoint answers with comma-separated text whose columns depend
//! on the export category. Columns are looked up by header name,
//! case-insensitively and in any order. A missing date column or a body
//! without data rows yields no records; malformed exports are not an error.

use std::collections::BTreeMap;

use crono_core::{
    BiometricRecord, ExerciseRecord, ExportKind, ExportRecords, FieldValue, NutritionRecord,
};

// ============================================================================
// Column Names
// ============================================================================

mod columns {
    pub const DATE: &str = "Date";
    pub const DAY: &str = "Day";
    pub const ENERGY: &str = "Energy (kcal)";
    pub const PROTEIN: &str = "Protein (g)";
    pub const CARBS: &str = "Carbs (g)";
    pub const FAT: &str = "Fat (g)";
    pub const TIME: &str = "Time";
    pub const EXERCISE: &str = "Exercise";
    pub const MINUTES: &str = "Minutes";
    pub const CALORIES_BURNED: &str = "Calories Burned";
    pub const GROUP: &str = "Group";
    pub const METRIC: &str = "Metric";
    pub const UNIT: &str = "Unit";
    pub const AMOUNT: &str = "Amount";
}

/// Serialized names of the fixed nutrition fields. Extra columns may not
/// shadow them.
const NUTRITION_FIELDS: &[&str] = &["date", "calories", "protein", "carbs", "fat"];

// ============================================================================
// Tokenizer
// ============================================================================

/// Splits delimited text into rows of fields.
///
/// Fields may be wrapped in double quotes, in which case they can contain
/// commas and newlines; `""` inside a quoted field is a literal quote.
/// Surrounding whitespace of the whole text is trimmed first, and a `\r`
/// before a row break is dropped.
pub fn parse_delimited_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => {
                if field.ends_with('\r') {
                    field.pop();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    row.push(field);
    rows.push(row);
    rows
}

// ============================================================================
// Table Helpers
// ============================================================================

/// Header row plus data rows, with by-name column lookup.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Returns `None` when there is no data row.
    fn parse(text: &str) -> Option<Self> {
        let mut rows = parse_delimited_rows(text);
        if rows.len() < 2 {
            return None;
        }
        let headers = rows.remove(0);
        Some(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

/// Trimmed cell text, empty when the column or cell is absent.
fn cell(row: &[String], column: Option<usize>) -> &str {
    column
        .and_then(|i| row.get(i))
        .map_or("", |value| value.trim())
}

/// Numeric cell, 0 when blank or not a finite number.
fn number(row: &[String], column: Option<usize>) -> f64 {
    cell(row, column)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Rows with a non-empty date, paired with that date.
fn dated_rows(table: &Table, date_column: usize) -> impl Iterator<Item = (String, &Vec<String>)> {
    table.rows.iter().filter_map(move |row| {
        let date = cell(row, Some(date_column));
        (!date.is_empty()).then(|| (date.to_string(), row))
    })
}

// ============================================================================
// Record Parsers
// ============================================================================

/// Parses a daily summary (nutrition) export.
///
/// Besides the four macro fields, every other populated column is kept
/// under its trimmed header name.
pub fn parse_nutrition(text: &str) -> Vec<NutritionRecord> {
    let Some(table) = Table::parse(text) else {
        return Vec::new();
    };
    let Some(date_col) = table.column(columns::DATE) else {
        return Vec::new();
    };
    let energy = table.column(columns::ENERGY);
    let protein = table.column(columns::PROTEIN);
    let carbs = table.column(columns::CARBS);
    let fat = table.column(columns::FAT);

    dated_rows(&table, date_col)
        .map(|(date, row)| {
            let mut extra = BTreeMap::new();
            for (i, header) in table.headers.iter().enumerate() {
                if i == date_col {
                    continue;
                }
                let key = header.trim();
                let value = cell(row, Some(i));
                if key.is_empty() || value.is_empty() || NUTRITION_FIELDS.contains(&key) {
                    continue;
                }
                extra.insert(key.to_string(), FieldValue::from_cell(value));
            }

            NutritionRecord {
                date,
                calories: number(row, energy),
                protein: number(row, protein),
                carbs: number(row, carbs),
                fat: number(row, fat),
                extra,
            }
        })
        .collect()
}

/// Parses an exercise export.
pub fn parse_exercises(text: &str) -> Vec<ExerciseRecord> {
    let Some(table) = Table::parse(text) else {
        return Vec::new();
    };
    let Some(day_col) = table.column(columns::DAY) else {
        return Vec::new();
    };
    let time = table.column(columns::TIME);
    let exercise = table.column(columns::EXERCISE);
    let minutes = table.column(columns::MINUTES);
    let calories = table.column(columns::CALORIES_BURNED);
    let group = table.column(columns::GROUP);

    dated_rows(&table, day_col)
        .map(|(date, row)| ExerciseRecord {
            date,
            time: cell(row, time).to_string(),
            exercise: cell(row, exercise).to_string(),
            minutes: number(row, minutes),
            calories_burned: number(row, calories),
            group: cell(row, group).to_string(),
        })
        .collect()
}

/// Parses a biometrics export.
///
/// Amounts stay text unless they are plain decimals, so composite readings
/// like `120/80` survive.
pub fn parse_biometrics(text: &str) -> Vec<BiometricRecord> {
    let Some(table) = Table::parse(text) else {
        return Vec::new();
    };
    let Some(day_col) = table.column(columns::DAY) else {
        return Vec::new();
    };
    let time = table.column(columns::TIME);
    let metric = table.column(columns::METRIC);
    let unit = table.column(columns::UNIT);
    let amount = table.column(columns::AMOUNT);

    dated_rows(&table, day_col)
        .map(|(date, row)| BiometricRecord {
            date,
            time: cell(row, time).to_string(),
            metric: cell(row, metric).to_string(),
            unit: cell(row, unit).to_string(),
            amount: FieldValue::from_amount(cell(row, amount)),
        })
        .collect()
}

/// Parses an export of the given kind.
pub fn parse_records(kind: ExportKind, text: &str) -> ExportRecords {
    match kind {
        ExportKind::Nutrition => ExportRecords::Nutrition(parse_nutrition(text)),
        ExportKind::Exercises => ExportRecords::Exercises(parse_exercises(text)),
        ExportKind::Biometrics => ExportRecords::Biometrics(parse_biometrics(text)),
    }
}

// ============================================================================
// Tests
// ============================================================================
