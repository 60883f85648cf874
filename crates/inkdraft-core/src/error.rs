use thiserror::Error;

/// Errors raised while building or saving a [`Canvas`](crate::Canvas).
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Width or height is not a positive, finite number.
    #[error("canvas {axis} must be a positive finite number, got {value}")]
    InvalidDimension { axis: &'static str, value: f64 },

    /// An origin was given with the wrong number of coordinates.
    #[error("origin must have exactly 2 coordinates, got {0}")]
    InvalidOrigin(usize),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
