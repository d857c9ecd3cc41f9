//! The top-level configuration check.
//!
//! [`check_conf`] coordinates the whole pass: per-section validation and
//! defaulting, cross-field normalization, step sequence construction, the
//! state-machine dry-run, and the pipeline-level business rules that are
//! legal in ordering but disallowed by data shape. It is a pure
//! validate -> normalize -> authorize function: no pixel-level computation
//! happens here, and the fully normalized document it returns is what step
//! executors consume.

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::core::errors::{PipelineError, SchemaError};
use crate::core::schema::require_object;
use crate::machine::PipelineMachine;
use crate::sections::{check_image_section, check_input_section};
use crate::steps::{PipelineStep, apply_derivations, check_pipeline_section, ensure_right_disp_map};

/// The recognized top-level keys of a configuration document.
const TOP_LEVEL_KEYS: &[&str] = &["input", "pipeline", "image"];

/// Validates and normalizes a whole configuration document.
///
/// The returned document has every default materialized and every field
/// present: the `image` section exists even when the user omitted it, absent
/// optional fields hold explicit nulls, and the `right_disp_map` placeholder
/// step is configured. The machine is reset at the start of the dry-run, so
/// a single instance can be reused across sequential calls; it is rebuilt
/// per pass by callers that validate configurations concurrently.
///
/// # Errors
///
/// - [`SchemaError`] (wrapped) when a section violates its schema or a
///   cross-field pairing rule.
/// - [`PipelineError::InvalidTransition`] when the step sequence is not a
///   legal walk through the pipeline state machine.
/// - [`PipelineError::UnsupportedCombination`] (fatal) when the order is
///   legal but the data shape makes the request meaningless.
pub fn check_conf(
    user_cfg: &Value,
    machine: &mut PipelineMachine,
) -> Result<Value, PipelineError> {
    let root = user_cfg.as_object().ok_or_else(|| {
        SchemaError::invalid_section("configuration", "expected a top-level object")
    })?;
    for key in root.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(SchemaError::unknown_field("configuration", key).into());
        }
    }

    let input = check_input_section(require_object(root, "input")?)?;
    let image = check_image_section(root)?;

    let mut steps = check_pipeline_section(require_object(root, "pipeline")?)?;
    ensure_right_disp_map(&mut steps);
    apply_derivations(&mut steps)?;

    let final_state = machine.validate_sequence(&steps)?;
    debug!(%final_state, "step sequence accepted");

    enforce_cross_checking_rule(&input, &steps)?;

    let mut pipeline = Map::new();
    for step in steps {
        pipeline.insert(step.name, Value::Object(step.params));
    }

    let mut normalized = Map::new();
    normalized.insert("image".to_string(), Value::Object(image));
    normalized.insert("input".to_string(), Value::Object(input));
    normalized.insert("pipeline".to_string(), Value::Object(pipeline));

    info!("configuration validated");
    Ok(Value::Object(normalized))
}

/// Cross-checking validation compares a left-computed and a right-computed
/// disparity map, so it requires right disparity bounds (scalar or grid).
/// A legal step order without them is still meaningless and must never reach
/// the step executors.
fn enforce_cross_checking_rule(
    input: &Map<String, Value>,
    steps: &[PipelineStep],
) -> Result<(), PipelineError> {
    let wants_cross_checking = steps
        .iter()
        .any(|step| step.name == "validation" && step.method == "cross_checking");
    if !wants_cross_checking {
        return Ok(());
    }

    let has_right_bounds = input.get("disp_min_right").is_some_and(|v| !v.is_null())
        && input.get("disp_max_right").is_some_and(|v| !v.is_null());
    if has_right_bounds {
        return Ok(());
    }

    error!("cross checking validation requested without right disparity bounds");
    Err(PipelineError::unsupported(
        "cross checking validation requires 'disp_min_right' and 'disp_max_right' in the input section",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let cfg = json!({
            "input": {
                "img_left": "left.png",
                "img_right": "right.png",
                "disp_min": -60,
                "disp_max": 0
            },
            "pipeline": {
                "stereo": {"stereo_method": "zncc"},
                "disparity": {"disparity_method": "wta"}
            },
            "outputs": {}
        });
        let err = check_conf(&cfg, &mut PipelineMachine::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn non_object_document_is_rejected() {
        let err = check_conf(&json!([]), &mut PipelineMachine::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::InvalidSection { .. })
        ));
    }

    #[test]
    fn missing_pipeline_section_is_rejected() {
        let cfg = json!({
            "input": {
                "img_left": "left.png",
                "img_right": "right.png",
                "disp_min": -60,
                "disp_max": 0
            }
        });
        let err = check_conf(&cfg, &mut PipelineMachine::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::MissingField { .. })
        ));
    }

    #[test]
    fn cross_checking_with_scalar_right_bounds_is_accepted() {
        let cfg = json!({
            "input": {
                "img_left": "left.png",
                "img_right": "right.png",
                "disp_min": -60,
                "disp_max": 0,
                "disp_min_right": 0,
                "disp_max_right": 60
            },
            "pipeline": {
                "right_disp_map": {"method": "accurate"},
                "stereo": {"stereo_method": "zncc"},
                "disparity": {"disparity_method": "wta"},
                "validation": {"validation_method": "cross_checking"}
            }
        });
        let normalized = check_conf(&cfg, &mut PipelineMachine::new()).unwrap();
        assert_eq!(
            normalized["pipeline"]["validation"]["right_left_mode"],
            json!("accurate")
        );
    }
}
