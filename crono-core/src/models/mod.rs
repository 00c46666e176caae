//! Domain models for crono.
//!
//! ## Submodules
//!
//! - [`export`] - Export kinds and their service category names
//! - [`records`] - Typed records parsed from export text

mod export;
mod records;

// Re-export everything at the models level
pub use export::ExportKind;
pub use records::{BiometricRecord, ExerciseRecord, ExportRecords, FieldValue, NutritionRecord};
#[cfg(test)]
mod serde_tests;
