//! GIF output: settings, global palette, frame diffing, the writer and file inspection.

pub mod diff;
pub mod inspect;
pub mod quantize;
pub mod settings;
pub mod writer;
