use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal failures. Anything that only drops a record or an annotation is
/// reported through [`crate::trace::SkipReason`] or
/// [`crate::render::RenderOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid cache geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv output failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("chart rendering failed: {message}")]
    Chart { message: String },
}

impl Error {
    pub fn geometry(message: impl Into<String>) -> Self {
        Error::InvalidGeometry { message: message.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn chart(err: impl std::fmt::Display) -> Self {
        Error::Chart { message: err.to_string() }
    }
}
