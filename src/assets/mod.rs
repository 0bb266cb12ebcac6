//! Material ownership, image decoding and PNG export.

/// Image and GIF decoding into premultiplied rasters.
pub mod decode;
/// PNG export with file-name sanitization.
pub mod export;
/// The material store.
pub mod store;
