//! Validation of the `image` section.
//!
//! Purely informational defaults describing no-data and valid-pixel marker
//! values. There are no cross-field constraints, so a typed struct with
//! serde-injected defaults is enough; the whole section is optional and is
//! materialized from defaults when absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::SchemaError;

/// No-data and valid-pixel marker values for the input images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSettings {
    /// No-data marker for the left image (default: 0).
    #[serde(default)]
    pub nodata1: i64,
    /// No-data marker for the right image (default: 0).
    #[serde(default)]
    pub nodata2: i64,
    /// Mask value flagging valid pixels (default: 0).
    #[serde(default)]
    pub valid_pixels: i64,
    /// Mask value flagging no-data pixels (default: 1).
    #[serde(default = "ImageSettings::default_no_data")]
    pub no_data: i64,
}

impl ImageSettings {
    fn default_no_data() -> i64 {
        1
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            nodata1: 0,
            nodata2: 0,
            valid_pixels: 0,
            no_data: Self::default_no_data(),
        }
    }
}

/// Validates the `image` section of the configuration root, injecting the
/// whole section from defaults when it is absent.
pub fn check_image_section(root: &Map<String, Value>) -> Result<Map<String, Value>, SchemaError> {
    let settings = match root.get("image") {
        None => ImageSettings::default(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| SchemaError::invalid_section("image", err.to_string()))?,
    };
    match serde_json::to_value(&settings) {
        Ok(Value::Object(section)) => Ok(section),
        _ => unreachable!("ImageSettings serializes to an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_section_is_fully_defaulted() {
        let section = check_image_section(&Map::new()).unwrap();
        assert_eq!(
            Value::Object(section),
            json!({"nodata1": 0, "nodata2": 0, "valid_pixels": 0, "no_data": 1})
        );
    }

    #[test]
    fn partial_section_keeps_user_values() {
        let root = json!({"image": {"nodata1": -32768}});
        let section = check_image_section(root.as_object().unwrap()).unwrap();
        assert_eq!(section["nodata1"], json!(-32768));
        assert_eq!(section["no_data"], json!(1));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let root = json!({"image": {"no_data": 1, "bogus": 7}});
        let err = check_image_section(root.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSection { .. }));
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let root = json!({"image": {"nodata1": "zero"}});
        assert!(check_image_section(root.as_object().unwrap()).is_err());
    }
}
