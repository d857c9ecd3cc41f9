//! Validation, normalization and sequencing core for stereo disparity
//! pipeline configurations.
//!
//! A user supplies a nested configuration describing an input dataset and an
//! ordered set of pipeline steps (matching-cost computation, disparity
//! selection, refinement, filtering, validation). This crate checks it,
//! fills in every method-dependent default, and authorizes the step sequence
//! against an explicit pipeline state machine before any computation starts:
//!
//! - [`sections`] - per-section schema checks and cross-field normalization
//!   of the `input` and `image` sections.
//! - [`steps`] - the pipeline step registry: per-method parameter schemas
//!   and named derivation rules for method-conditional defaults.
//! - [`machine`] - the finite state machine over pipeline progress and its
//!   dry-run driver.
//! - [`check`] - the top-level [`check_conf`] coordinator.
//!
//! The numerical algorithms, image/grid content I/O and the step executors
//! are external collaborators: they consume the normalized document this
//! crate produces.
//!
//! # Example
//!
//! ```
//! use parallax::{PipelineMachine, check_conf};
//! use serde_json::json;
//!
//! let cfg = json!({
//!     "input": {
//!         "img_left": "left.png",
//!         "img_right": "right.png",
//!         "disp_min": -60,
//!         "disp_max": 0
//!     },
//!     "pipeline": {
//!         "stereo": {"stereo_method": "zncc", "window_size": 5},
//!         "disparity": {"disparity_method": "wta"}
//!     }
//! });
//!
//! let mut machine = PipelineMachine::new();
//! let normalized = check_conf(&cfg, &mut machine).unwrap();
//! assert_eq!(normalized["pipeline"]["disparity"]["invalid_disparity"], json!(-9999));
//! ```

pub mod check;
pub mod core;
pub mod machine;
pub mod sections;
pub mod steps;
pub mod utils;

pub use crate::check::check_conf;
pub use crate::core::errors::{PipelineError, SchemaError};
pub use crate::core::schema::{DefaultValue, FieldKind, FieldRule, Requirement, SectionSchema};
pub use crate::machine::{PipelineMachine, State};
pub use crate::sections::{ImageSettings, check_image_section, check_input_section};
pub use crate::steps::{
    DERIVATION_RULES, Derivation, DerivationRule, MethodSchema, PipelineStep, STEPS,
    StepDescriptor, apply_derivations, check_pipeline_section, ensure_right_disp_map,
};
