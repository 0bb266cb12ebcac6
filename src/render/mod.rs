//! Pixel buffers, blending, frame composition and the parallel frame pipeline.

pub mod composite;
pub mod compositor;
pub mod pipeline;
pub mod raster;
