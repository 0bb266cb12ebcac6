//! Reusable timeline structure, detached from concrete materials.

pub mod codec;
