//! Serde tests for record types.
//!
//! The serialized field names are consumed by presentation layers, so these
//! tests pin the exact JSON shape of every record.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::{
    BiometricRecord, ExerciseRecord, ExportKind, ExportRecords, FieldValue, NutritionRecord,
};

// ============================================================================
// FieldValue Serde Tests
// ============================================================================

#[test]
fn test_field_value_serializes_untagged() {
    assert_eq!(serde_json::to_value(FieldValue::Number(212.5)).unwrap(), json!(212.5));
    assert_eq!(
        serde_json::to_value(FieldValue::Text("120/80".to_string())).unwrap(),
        json!("120/80")
    );
}

#[test]
fn test_field_value_deserializes_untagged() {
    let number: FieldValue = serde_json::from_str("58").unwrap();
    assert_eq!(number, FieldValue::Number(58.0));
    let text: FieldValue = serde_json::from_str(r#""Lunch""#).unwrap();
    assert_eq!(text, FieldValue::Text("Lunch".to_string()));
}

// ============================================================================
// Record Serde Tests
// ============================================================================

#[test]
fn test_nutrition_record_flattens_extra_columns() {
    let mut extra = BTreeMap::new();
    extra.insert("Fiber (g)".to_string(), FieldValue::Number(31.0));
    extra.insert("Completed".to_string(), FieldValue::Text("true".to_string()));

    let record = NutritionRecord {
        date: "2026-02-11".to_string(),
        calories: 1847.0,
        protein: 168.0,
        carbs: 142.0,
        fat: 58.0,
        extra,
    };

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["date"], json!("2026-02-11"));
    assert_eq!(value["calories"], json!(1847));
    assert_eq!(value["protein"], json!(168));
    assert_eq!(value["carbs"], json!(142));
    assert_eq!(value["fat"], json!(58));
    assert_eq!(value["Fiber (g)"], json!(31));
    assert_eq!(value["Completed"], json!("true"));
    assert!(value.get("extra").is_none());
    assert_eq!(
        serde_json::to_string(&record).unwrap(),
        concat!(
            r#"{"date":"2026-02-11","calories":1847,"protein":168,"carbs":142,"fat":58,"#,
            r#""Completed":"true","Fiber (g)":31}"#
        )
    );
}

#[test]
fn test_fractional_numbers_keep_fraction() {
    let record = ExerciseRecord {
        date: "2026-02-11".to_string(),
        time: "07:30 AM".to_string(),
        exercise: "Walking".to_string(),
        minutes: 42.5,
        calories_burned: 180.0,
        group: "Cardiovascular".to_string(),
    };

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["minutes"], json!(42.5));
    assert_eq!(value["caloriesBurned"], json!(180));
    assert_eq!(serde_json::to_value(FieldValue::Number(-3.0)).unwrap(), json!(-3));
}

#[test]
fn test_exercise_record_field_names() {
    let record = ExerciseRecord {
        date: "2026-02-11".to_string(),
        time: "07:30 AM".to_string(),
        exercise: "Running".to_string(),
        minutes: 30.0,
        calories_burned: 350.0,
        group: "Cardiovascular".to_string(),
    };

    let value = serde_json::to_value(&record).unwrap();
    let Value::Object(map) = value else {
        panic!("expected an object");
    };
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["caloriesBurned", "date", "exercise", "group", "minutes", "time"]
    );
}

#[test]
fn test_biometric_record_roundtrip() {
    let record = BiometricRecord {
        date: "2026-02-09".to_string(),
        time: "09:00 AM".to_string(),
        metric: "Blood Pressure".to_string(),
        unit: "mmHg".to_string(),
        amount: FieldValue::Text("120/80".to_string()),
    };

    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains(r#""amount":"120/80""#));
    let parsed: BiometricRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn test_export_records_serialize_as_array() {
    let records = ExportRecords::Biometrics(vec![BiometricRecord {
        date: "2026-02-11".to_string(),
        time: "08:00 AM".to_string(),
        metric: "Weight".to_string(),
        unit: "lbs".to_string(),
        amount: FieldValue::Number(212.5),
    }]);

    let value = serde_json::to_value(&records).unwrap();
    assert_eq!(
        value,
        json!([{
            "date": "2026-02-11",
            "time": "08:00 AM",
            "metric": "Weight",
            "unit": "lbs",
            "amount": 212.5
        }])
    );
}

// ============================================================================
// ExportKind Serde Tests
// ============================================================================

#[test]
fn test_export_kind_serde_lowercase() {
    for kind in ExportKind::all() {
        let json = serde_json::to_string(kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.cli_name()));
        let parsed: ExportKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, *kind);
    }
}
