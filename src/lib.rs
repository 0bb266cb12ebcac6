//! Animated GIF assembly.
//!
//! Materials (decoded images and sprite-sheet tiles) live in a [`MaterialStore`]. A [`Sequence`]
//! of timed frames references them by [`MaterialId`], either directly or through positioned
//! layers. Sequences are composited, quantized and encoded into GIF bytes with
//! [`export_gif`], or reduced to a reusable [`Template`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod batch;
pub mod encode;
pub mod foundation;
pub mod render;
pub mod sequence;
pub mod session;
pub mod template;
pub mod tiles;

pub use assets::decode::{decode_gif, decode_image};
pub use assets::export::{export_png, sanitize_file_stem};
pub use assets::store::{Material, MaterialId, MaterialOrigin, MaterialStore};
pub use batch::{BatchJob, BatchReport, BatchSource, process_batch};
pub use encode::inspect::{GifInfo, inspect_gif};
pub use encode::settings::{GifSettings, PaletteSize};
pub use encode::writer::{GifEncodeStats, export_gif, export_gif_to_file, export_gif_with_stats};
pub use foundation::core::{Canvas, PixelRect};
pub use foundation::error::{GifloomError, GifloomResult};
pub use render::composite::ChromaKey;
pub use render::compositor::{ComposeOpts, compose_frame};
pub use render::pipeline::{CancelToken, RenderThreading, render_preview};
pub use render::raster::{Raster, Resample};
pub use sequence::model::{Frame, FrameContent, Layer, Sequence};
pub use session::workspace::Workspace;
pub use template::codec::{BindMode, Template, export_template, import_template};
pub use tiles::grid::{GridSpec, TilePosition, TileSelection, TileSource, split_into_store};
