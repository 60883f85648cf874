//! Rasterized images and the [`Rasterize`] extension for [`Canvas`].

use crate::backend::{RasterBackend, backend};
use crate::error::RasterError;
use inkdraft_core::Canvas;
use inkdraft_core::encode::png_data_uri;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Where the PNG data of a [`Raster`] lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// A rasterized image, held in memory or backed by a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    source: RasterSource,
}

impl Raster {
    pub fn from_png(bytes: Vec<u8>) -> Self {
        Self {
            source: RasterSource::Bytes(bytes),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: RasterSource::File(path.into()),
        }
    }

    /// Rasterize `svg` in memory with the process-wide backend.
    pub fn from_svg(svg: &str) -> Result<Self, RasterError> {
        Self::from_svg_with(backend(), svg)
    }

    pub fn from_svg_with(backend: &dyn RasterBackend, svg: &str) -> Result<Self, RasterError> {
        Ok(Self::from_png(backend.svg_to_png(svg)?))
    }

    /// Rasterize `svg` straight to `path`. The result reads back from the file.
    pub fn from_svg_to_file(svg: &str, path: impl AsRef<Path>) -> Result<Self, RasterError> {
        Self::from_svg_to_file_with(backend(), svg, path)
    }

    pub fn from_svg_to_file_with(
        backend: &dyn RasterBackend,
        svg: &str,
        path: impl AsRef<Path>,
    ) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let png = backend.svg_to_png(svg)?;
        std::fs::write(path, png).map_err(|e| RasterError::io(path, e))?;
        log::info!("wrote {}", path.display());
        Ok(Self::from_file(path))
    }

    pub fn source(&self) -> &RasterSource {
        &self.source
    }

    /// The PNG bytes, if any source yields them.
    ///
    /// Empty in-memory data and unreadable files count as absent.
    pub fn png_bytes(&self) -> Option<Cow<'_, [u8]>> {
        match &self.source {
            RasterSource::Bytes(bytes) if !bytes.is_empty() => Some(Cow::Borrowed(bytes)),
            RasterSource::Bytes(_) => None,
            RasterSource::File(path) => match std::fs::read(path) {
                Ok(bytes) => Some(Cow::Owned(bytes)),
                Err(e) => {
                    log::debug!("cannot read back {}: {e}", path.display());
                    None
                }
            },
        }
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        let path = path.as_ref();
        let png = self.png_bytes().ok_or(RasterError::Empty)?;
        std::fs::write(path, &png).map_err(|e| RasterError::io(path, e))?;
        log::info!("wrote {}", path.display());
        Ok(())
    }

    /// `data:image/png;base64,...`.
    pub fn as_data_uri(&self) -> Result<String, RasterError> {
        let png = self.png_bytes().ok_or(RasterError::Empty)?;
        Ok(png_data_uri(&png))
    }
}

// ─── Canvas extension ─────────────────────────────────────────────────────

/// PNG output for anything that serializes to SVG.
pub trait Rasterize {
    fn rasterize(&self) -> Result<Raster, RasterError>;

    fn rasterize_to_file(&self, path: impl AsRef<Path>) -> Result<Raster, RasterError>;

    fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        self.rasterize()?.save_png(path)
    }
}

impl Rasterize for Canvas {
    fn rasterize(&self) -> Result<Raster, RasterError> {
        Raster::from_svg(&self.as_svg())
    }

    fn rasterize_to_file(&self, path: impl AsRef<Path>) -> Result<Raster, RasterError> {
        Raster::from_svg_to_file(&self.as_svg(), path)
    }
}
