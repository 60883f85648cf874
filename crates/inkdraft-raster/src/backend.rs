//! Rasterization backends.
//!
//! The process-wide backend is resolved once, on first use. A build without
//! the `resvg` feature resolves to [`MissingBackend`], which logs a warning
//! at resolution time and fails every call with the same remediation message.

use crate::error::RasterError;
use std::sync::LazyLock;

/// Converts SVG text to PNG bytes.
pub trait RasterBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn svg_to_png(&self, svg: &str) -> Result<Vec<u8>, RasterError>;
}

/// Remediation shown when rasterization is compiled out.
pub const MISSING_RESVG: &str = "inkdraft-raster was built without the `resvg` feature, so it \
cannot output PNG or other raster formats. Rebuild with \
`inkdraft-raster = { version = \"0.1\", features = [\"resvg\"] }`.";

static BACKEND: LazyLock<Box<dyn RasterBackend>> = LazyLock::new(load_backend);

/// The backend used by [`Raster::from_svg`](crate::Raster::from_svg) and friends.
pub fn backend() -> &'static dyn RasterBackend {
    BACKEND.as_ref()
}

#[cfg(feature = "resvg")]
fn load_backend() -> Box<dyn RasterBackend> {
    log::debug!("raster backend: resvg");
    Box::new(ResvgBackend)
}

#[cfg(not(feature = "resvg"))]
fn load_backend() -> Box<dyn RasterBackend> {
    let missing = MissingBackend::new(MISSING_RESVG);
    log::warn!("{MISSING_RESVG}");
    Box::new(missing)
}

// ─── Missing ──────────────────────────────────────────────────────────────

/// Stand-in for an unavailable backend. Every call fails with `message`.
#[derive(Debug, Clone)]
pub struct MissingBackend {
    message: String,
}

impl MissingBackend {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl RasterBackend for MissingBackend {
    fn name(&self) -> &'static str {
        "missing"
    }

    fn svg_to_png(&self, _svg: &str) -> Result<Vec<u8>, RasterError> {
        Err(RasterError::MissingDependency(self.message.clone()))
    }
}

// ─── resvg ────────────────────────────────────────────────────────────────

/// Renders with `resvg`, using the SVG's `width`/`height` as the pixel size.
#[cfg(feature = "resvg")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgBackend;

#[cfg(feature = "resvg")]
impl RasterBackend for ResvgBackend {
    fn name(&self) -> &'static str {
        "resvg"
    }

    fn svg_to_png(&self, svg: &str) -> Result<Vec<u8>, RasterError> {
        use resvg::{tiny_skia, usvg};

        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();

        let tree =
            usvg::Tree::from_str(svg, &options).map_err(|e| RasterError::Parse(e.to_string()))?;
        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            RasterError::Render(format!(
                "cannot allocate a {}x{} pixmap",
                size.width(),
                size.height()
            ))
        })?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        log::debug!("rasterized {}x{} image", size.width(), size.height());
        pixmap
            .encode_png()
            .map_err(|e| RasterError::Render(e.to_string()))
    }
}
