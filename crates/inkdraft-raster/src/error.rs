use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    /// No rasterization backend is available in this build.
    #[error("{0}")]
    MissingDependency(String),

    #[error("invalid SVG: {0}")]
    Parse(String),

    #[error("rendering failed: {0}")]
    Render(String),

    /// A file-backed raster could not be read back.
    #[error("raster has no readable PNG data")]
    Empty,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RasterError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        RasterError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
