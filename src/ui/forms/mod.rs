//! Form rendering module
//!
//! - `field_renderer`: one field of any kind, with its error
//! - `section`: sections, repeatable items and their buttons

mod field_renderer;
mod section;

pub use field_renderer::{draw_field, field_height, FieldView};
pub use section::draw_sections;
