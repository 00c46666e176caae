//! Export kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Export Kind
// ============================================================================

/// The record types that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Daily nutrition summaries.
    Nutrition,
    /// Logged exercises.
    Exercises,
    /// Biometric readings (weight, blood pressure, ...).
    Biometrics,
}

impl ExportKind {
    /// Returns the service's internal export category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Nutrition => "dailySummary",
            Self::Exercises => "exercises",
            Self::Biometrics => "biometrics",
        }
    }

    /// Returns the CLI name for this kind.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Exercises => "exercises",
            Self::Biometrics => "biometrics",
        }
    }

    /// Returns all export kinds.
    pub fn all() -> &'static [ExportKind] {
        &[Self::Nutrition, Self::Exercises, Self::Biometrics]
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ExportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name() == lower)
            .ok_or_else(|| CoreError::UnknownExportKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(ExportKind::Nutrition.category(), "dailySummary");
        assert_eq!(ExportKind::Exercises.category(), "exercises");
        assert_eq!(ExportKind::Biometrics.category(), "biometrics");
    }

    #[test]
    fn test_from_str() {
        for kind in ExportKind::all() {
            assert_eq!(kind.cli_name().parse::<ExportKind>().unwrap(), *kind);
        }
        assert_eq!("Nutrition".parse::<ExportKind>().unwrap(), ExportKind::Nutrition);
        assert!(matches!(
            "food".parse::<ExportKind>(),
            Err(CoreError::UnknownExportKind(name)) if name == "food"
        ));
    }
}
