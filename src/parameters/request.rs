// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Request and response bodies of the calibration endpoints

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::registers::Tank;

/// Calibration values submitted by the level configuration page.
///
/// The page posts form values as strings, scripts tend to post numbers;
/// both are accepted and kept as text until the codec parses them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterUpdateRequest {
    #[serde(default)]
    pub tank: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub zero_pf: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub full_pf: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub level_full_mm: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub level_high_set: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub level_low_set: Option<String>,
    /// Presence of this field enables the oscillator (advanced) settings.
    #[serde(default, deserialize_with = "string_or_number")]
    pub osc_res1: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub osc_res2: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub osc_k_val: Option<String>,
}

impl ParameterUpdateRequest {
    pub fn has_advanced_settings(&self) -> bool {
        self.osc_res1.is_some()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field: Option<RawField> = Option::deserialize(deserializer)?;
    Ok(field.map(|field| match field {
        RawField::Text(text) => text,
        RawField::Number(number) => number.to_string(),
        RawField::Flag(flag) => flag.to_string(),
    }))
}

/// Result of a parameter operation, reported to clients as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Ok,
    CacheUnreachable,
    NothingToUpdate,
    /// Every pending write was confirmed; carries the confirmation count.
    Updated(usize),
    Failed,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStatus::Ok => f.write_str("ok"),
            UpdateStatus::CacheUnreachable => f.write_str("cache-unreachable"),
            UpdateStatus::NothingToUpdate => f.write_str("nothing-to-update"),
            UpdateStatus::Updated(count) => write!(f, "{} parameter(s) updated", count),
            UpdateStatus::Failed => f.write_str("failed"),
        }
    }
}

impl Serialize for UpdateStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Response of `update_parameters`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    /// Tank whose writes were staged, `null` when nothing was attempted.
    pub updated: Option<Tank>,
    /// Register writes staged by this call, in staging order.
    #[serde(skip)]
    pub staged: Vec<(crate::registers::RegisterAddress, i64)>,
}

/// Response of `get_update_status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub status: UpdateStatus,
}

/// Current calibration of a tank, in engineering units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationSnapshot {
    pub zero_pf: f64,
    pub full_pf: f64,
    pub level_full_mm: f64,
    pub level_high_set: f64,
    pub level_low_set: f64,
    pub osc_res1: i64,
    pub osc_res2: i64,
    pub osc_k_val: f64,
    /// Capacitance gain per centimetre of liquid, 0 without a full level.
    pub pf_per_cm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_strings_and_numbers() {
        let request: ParameterUpdateRequest = serde_json::from_str(
            r#"{"tank":"overhead1","zeroPf":"12.5","fullPf":40,"levelFullMm":500.5,"levelHighSet":"90","levelLowSet":null}"#,
        )
        .unwrap();
        assert_eq!(request.tank, "overhead1");
        assert_eq!(request.zero_pf.as_deref(), Some("12.5"));
        assert_eq!(request.full_pf.as_deref(), Some("40"));
        assert_eq!(request.level_full_mm.as_deref(), Some("500.5"));
        assert_eq!(request.level_low_set, None);
        assert!(!request.has_advanced_settings());
    }

    #[test]
    fn test_request_advanced_toggle() {
        let request: ParameterUpdateRequest =
            serde_json::from_str(r#"{"tank":"underground","oscRes1":"70000"}"#).unwrap();
        assert!(request.has_advanced_settings());
        assert_eq!(request.osc_k_val, None);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(UpdateStatus::Ok.to_string(), "ok");
        assert_eq!(UpdateStatus::Updated(3).to_string(), "3 parameter(s) updated");
        let json = serde_json::to_value(StatusReport {
            status: UpdateStatus::NothingToUpdate,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "nothing-to-update"}));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = UpdateOutcome {
            status: UpdateStatus::CacheUnreachable,
            updated: None,
            staged: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"status": "cache-unreachable", "updated": null})
        );
    }

    #[test]
    fn test_snapshot_field_names() {
        let snapshot = CalibrationSnapshot {
            zero_pf: 12.5,
            full_pf: 40.0,
            level_full_mm: 500.0,
            level_high_set: 90.0,
            level_low_set: 10.0,
            osc_res1: 70000,
            osc_res2: 0,
            osc_k_val: 1.25,
            pf_per_cm: 0.55,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "zeroPf", "fullPf", "levelFullMm", "levelHighSet", "levelLowSet", "oscRes1",
            "oscRes2", "oscKVal", "pfPerCm",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }
}
