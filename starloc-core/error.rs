#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("keypoint/descriptor count mismatch: {keypoints} keypoints, {descriptors} descriptors")]
    LengthMismatch { keypoints: usize, descriptors: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),
    #[error("configuration parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
