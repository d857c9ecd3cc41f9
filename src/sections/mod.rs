//! Per-section validation of the configuration document.
//!
//! One module per top-level section. The pipeline section has its own module
//! at the crate root (`steps`) because its entries are method-discriminated
//! and feed the state machine.

pub mod image;
pub mod input;

pub use image::{ImageSettings, check_image_section};
pub use input::{INPUT_SCHEMA, check_input_section};
