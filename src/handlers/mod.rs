//! HTTP handlers for Argus

mod health;
mod track;

pub use health::*;
pub use track::*;
