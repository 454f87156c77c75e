use starloc_core::CoreError;

#[derive(thiserror::Error, Debug)]
pub enum OrbError {
    #[error("invalid ORB configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Features(#[from] CoreError),
}

pub type OrbResult<T> = Result<T, OrbError>;
