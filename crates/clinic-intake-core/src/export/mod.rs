//! Document export for completed intake forms.

mod document;

pub use document::*;
