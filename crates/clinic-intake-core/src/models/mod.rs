//! Domain models for clinic intake.

mod catalog;
mod contact;
mod form;
mod patient;

pub use catalog::*;
pub use contact::*;
pub use form::*;
pub use patient::*;
