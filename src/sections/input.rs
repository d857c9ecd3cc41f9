//! Validation and normalization of the `input` section.
//!
//! The section-local schema lives in [`INPUT_SCHEMA`]; the cross-field rules
//! that span several fields (disparity-bound pairing) are applied on top of
//! it by [`check_input_section`]. Individual bounds cannot be checked in
//! isolation: legality depends on whether a bound is a scalar or a per-pixel
//! grid path, and on whether both members of the right-side pair are present.

use std::path::Path;

use serde_json::{Map, Value};

use crate::core::errors::SchemaError;
use crate::core::schema::{DefaultValue, FieldKind, FieldRule, Requirement, SectionSchema};

/// Rule table for the `input` section.
pub const INPUT_SCHEMA: SectionSchema = SectionSchema {
    name: "input",
    fields: &[
        FieldRule {
            key: "img_left",
            kind: FieldKind::Str,
            requirement: Requirement::Required,
        },
        FieldRule {
            key: "img_right",
            kind: FieldKind::Str,
            requirement: Requirement::Required,
        },
        FieldRule {
            key: "disp_min",
            kind: FieldKind::Bound,
            requirement: Requirement::Required,
        },
        FieldRule {
            key: "disp_max",
            kind: FieldKind::Bound,
            requirement: Requirement::Required,
        },
        FieldRule {
            key: "disp_min_right",
            kind: FieldKind::NullableBound,
            requirement: Requirement::Optional,
        },
        FieldRule {
            key: "disp_max_right",
            kind: FieldKind::NullableBound,
            requirement: Requirement::Optional,
        },
        FieldRule {
            key: "left_mask",
            kind: FieldKind::NullableStr,
            requirement: Requirement::Defaulted(DefaultValue::Null),
        },
        FieldRule {
            key: "right_mask",
            kind: FieldKind::NullableStr,
            requirement: Requirement::Defaulted(DefaultValue::Null),
        },
    ],
};

/// The two kinds a disparity bound can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundKind {
    /// A scalar search-range bound.
    Scalar,
    /// A path to a per-pixel grid.
    Grid,
}

fn bound_kind(value: &Value) -> Option<BoundKind> {
    if value.is_i64() {
        Some(BoundKind::Scalar)
    } else if value.is_string() {
        Some(BoundKind::Grid)
    } else {
        None
    }
}

/// Validates and normalizes the `input` section.
///
/// Runs the section schema, then the disparity-bound pairing rules. On
/// success every optional field is materialized: absent masks and absent
/// right-side bounds become explicit nulls so downstream consumers can rely
/// on key presence.
pub fn check_input_section(section: &Map<String, Value>) -> Result<Map<String, Value>, SchemaError> {
    let mut normalized = INPUT_SCHEMA.check(section)?;
    normalize_disparity_bounds(&mut normalized)?;
    Ok(normalized)
}

/// Applies the cross-field pairing rules over the disparity bounds.
///
/// - `disp_min` / `disp_max` must be of the same kind.
/// - `disp_min_right` / `disp_max_right` are either both absent (normalized
///   to null) or both present and of the same kind as the left pair.
/// - Right-side grids must exist as readable paths; existence only, the grid
///   content is the grid I/O collaborator's concern.
fn normalize_disparity_bounds(input: &mut Map<String, Value>) -> Result<(), SchemaError> {
    let left_kind = match (bound_kind(&input["disp_min"]), bound_kind(&input["disp_max"])) {
        (Some(min), Some(max)) if min == max => min,
        _ => {
            return Err(SchemaError::mismatched_pair(
                "input", "disp_min", "disp_max",
            ));
        }
    };

    let min_right = input
        .get("disp_min_right")
        .filter(|value| !value.is_null())
        .cloned();
    let max_right = input
        .get("disp_max_right")
        .filter(|value| !value.is_null())
        .cloned();

    match (min_right, max_right) {
        (None, None) => {
            input.insert("disp_min_right".to_string(), Value::Null);
            input.insert("disp_max_right".to_string(), Value::Null);
        }
        (Some(_), None) => {
            return Err(SchemaError::lone_pair_member(
                "input",
                "disp_min_right",
                "disp_max_right",
            ));
        }
        (None, Some(_)) => {
            return Err(SchemaError::lone_pair_member(
                "input",
                "disp_max_right",
                "disp_min_right",
            ));
        }
        (Some(min), Some(max)) => {
            if bound_kind(&min) != Some(left_kind) {
                return Err(SchemaError::mismatched_pair(
                    "input",
                    "disp_min",
                    "disp_min_right",
                ));
            }
            if bound_kind(&max) != Some(left_kind) {
                return Err(SchemaError::mismatched_pair(
                    "input",
                    "disp_max",
                    "disp_max_right",
                ));
            }
            if left_kind == BoundKind::Grid {
                ensure_grid_exists("disp_min_right", &min)?;
                ensure_grid_exists("disp_max_right", &max)?;
            }
        }
    }

    Ok(())
}

fn ensure_grid_exists(field: &str, value: &Value) -> Result<(), SchemaError> {
    // The kind check above guarantees a string here.
    let path = value.as_str().unwrap_or_default();
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(SchemaError::GridNotFound {
            field: field.to_string(),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn section(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn absent_right_bounds_become_explicit_nulls() {
        let checked = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": "grids/disp_min.tif",
            "disp_max": "grids/disp_max.tif"
        })))
        .unwrap();
        assert_eq!(checked["disp_min_right"], Value::Null);
        assert_eq!(checked["disp_max_right"], Value::Null);
        assert_eq!(checked["left_mask"], Value::Null);
        assert_eq!(checked["right_mask"], Value::Null);
    }

    #[test]
    fn scalar_bounds_are_accepted() {
        let checked = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": -60,
            "disp_max": 0
        })))
        .unwrap();
        assert_eq!(checked["disp_min"], json!(-60));
    }

    #[test]
    fn right_grids_pass_through_when_they_exist() {
        let min = NamedTempFile::new().unwrap();
        let max = NamedTempFile::new().unwrap();
        let min_path = min.path().to_str().unwrap();
        let max_path = max.path().to_str().unwrap();
        let checked = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": "grids/disp_min.tif",
            "disp_max": "grids/disp_max.tif",
            "disp_min_right": min_path,
            "disp_max_right": max_path
        })))
        .unwrap();
        assert_eq!(checked["disp_min_right"], json!(min_path));
        assert_eq!(checked["disp_max_right"], json!(max_path));
    }

    #[test]
    fn missing_right_grid_file_is_rejected() {
        let err = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": "grids/disp_min.tif",
            "disp_max": "grids/disp_max.tif",
            "disp_min_right": "grids/absent_min.tif",
            "disp_max_right": "grids/absent_max.tif"
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::GridNotFound { .. }));
    }

    #[test]
    fn mixed_left_pair_is_rejected() {
        let err = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": "grids/disp_min.tif",
            "disp_max": 45
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::MismatchedPair { .. }));
    }

    #[test]
    fn scalar_right_bound_with_grid_left_pair_is_rejected() {
        let err = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": "grids/disp_min.tif",
            "disp_max": "grids/disp_max.tif",
            "disp_min_right": -4,
            "disp_max_right": 0
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::MismatchedPair { .. }));
    }

    #[test]
    fn lone_right_member_is_rejected() {
        let err = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": "grids/disp_min.tif",
            "disp_max": "grids/disp_max.tif",
            "disp_max_right": "grids/disp_max.tif"
        })))
        .unwrap_err();
        match err {
            SchemaError::LonePairMember { present, missing, .. } => {
                assert_eq!(present, "disp_max_right");
                assert_eq!(missing, "disp_min_right");
            }
            other => panic!("expected LonePairMember, got {other:?}"),
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = check_input_section(&section(json!({
            "img_left": "left.png",
            "img_right": "right.png",
            "disp_min": -60,
            "disp_max": 0
        })))
        .unwrap();
        let twice = check_input_section(&once).unwrap();
        assert_eq!(once, twice);
    }
}
