//! Core building blocks of the configuration checker.
//!
//! - Error taxonomy for schema, ordering and combination defects.
//! - Declarative section schemas expressed as plain rule tables.

pub mod errors;
pub mod schema;

pub use errors::{PipelineError, SchemaError};
pub use schema::{DefaultValue, FieldKind, FieldRule, Requirement, SectionSchema};
