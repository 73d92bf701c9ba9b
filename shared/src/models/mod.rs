//! Domain models for battery health certificates

mod battery;
mod certificate;

pub use battery::*;
pub use certificate::*;
