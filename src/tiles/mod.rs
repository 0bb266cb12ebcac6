//! Sprite-sheet splitting into tile materials.

/// Grid specs, tile selection and batch splitting.
pub mod grid;
