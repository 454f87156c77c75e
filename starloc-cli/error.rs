use std::path::PathBuf;

use starloc_core::CoreError;
use starloc_geometry::GeometryError;
use starloc_orb::OrbError;

#[derive(thiserror::Error, Debug)]
pub enum LocateError {
    #[error("image {} cannot be loaded: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("feature extraction failed: {0}")]
    Features(#[from] OrbError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[cfg(feature = "viewer")]
    #[error("viewer failed: {0}")]
    Viewer(#[from] eframe::Error),
}

impl From<CoreError> for LocateError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => LocateError::Io(e),
            other => LocateError::Config(other.to_string()),
        }
    }
}

pub type LocateResult<T> = Result<T, LocateError>;
