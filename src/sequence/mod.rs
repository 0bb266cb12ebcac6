//! Ordered frame timeline and its structural edits.

pub mod editor;
pub mod model;
