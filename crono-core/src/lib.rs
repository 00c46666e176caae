// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # crono Core
//!
//! Core types, models, and date handling shared by the other `crono` crates.
//!
//! This crate has no network or filesystem access. It provides:
//!
//! - Typed export records (nutrition, exercise, biometric)
//! - The export kind enum and its mapping to the service's categories
//! - Calendar date and date-range resolution
//! - Error types
//!
//! ## Key Types
//!
//! ### Records
//! - [`NutritionRecord`] - Daily nutrition summary row
//! - [`ExerciseRecord`] - Logged exercise row
//! - [`BiometricRecord`] - Logged biometric reading
//! - [`FieldValue`] - Number-or-text cell value
//! - [`ExportRecords`] - Parsed records of one export kind
//!
//! ### Dates
//! - [`DateRange`] - Inclusive start/end pair
//! - [`Clock`] - Source of "today" ([`SystemClock`], [`FixedClock`])

pub mod dates;
pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export date resolution
pub use dates::{
    date_range, format_day, parse_date, parse_day, parse_range, parse_range_with, resolve_date,
    resolve_date_with, today_str, today_str_with, Clock, DateRange, FixedClock, SystemClock,
};

// Re-export all model types
pub use models::{
    BiometricRecord, ExerciseRecord, ExportKind, ExportRecords, FieldValue, NutritionRecord,
};
