//! Local storage for transient request data

pub mod scratch;

pub use scratch::{ScratchDir, TempImage};
