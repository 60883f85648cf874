//! PNG output for inkdraft canvases.
//!
//! Rasterization is delegated to a [`RasterBackend`]. With the default
//! `resvg` feature that is [`ResvgBackend`]; without it every call fails
//! with [`RasterError::MissingDependency`], while SVG output keeps working.

pub mod backend;
pub mod error;
pub mod raster;

pub use backend::{MissingBackend, RasterBackend, backend};
#[cfg(feature = "resvg")]
pub use backend::ResvgBackend;
pub use error::RasterError;
pub use raster::{Raster, RasterSource, Rasterize};
